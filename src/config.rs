/// Build configuration taken from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Native C++ compiler executable (`FLOW_COMPILER`, default `g++`).
    pub compiler: String,
    /// Language standard handed to the compiler (`FLOW_STD`, default `c++20`).
    pub cpp_std: String,
    /// Debug tracing toggle (`FLOW_DEBUG`).
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            compiler: env_or("FLOW_COMPILER", "g++"),
            cpp_std: env_or("FLOW_STD", "c++20"),
            debug: env_or("FLOW_DEBUG", "false") == "true",
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}
