//! The builtin intrinsic table: call names with fixed arities that lower to
//! literal C++ fragments instead of user-defined calls. A name/arity pair
//! missing here falls through to generic call emission.

use super::runtime;

pub fn lower(name: &str, args: &[String]) -> Option<String> {
    let out = match (name, args.len()) {
        // Conversions
        ("to_int", 1) => format!("std::stoi({})", args[0]),
        ("to_float", 1) => format!("std::stod({})", args[0]),
        ("to_string", 1) => format!("std::to_string({})", args[0]),

        // Strings
        ("length", 1) => format!("static_cast<int>(std::string({}).size())", args[0]),
        ("upper", 1) => format!(
            "[&]() {{ std::string s = {}; std::transform(s.begin(), s.end(), s.begin(), ::toupper); return s; }}()",
            args[0]
        ),
        ("lower", 1) => format!(
            "[&]() {{ std::string s = {}; std::transform(s.begin(), s.end(), s.begin(), ::tolower); return s; }}()",
            args[0]
        ),
        ("trim", 1) => format!(
            r#"[&]() {{ std::string s = {}; s.erase(0, s.find_first_not_of(" \t\n\r")); s.erase(s.find_last_not_of(" \t\n\r") + 1); return s; }}()"#,
            args[0]
        ),
        ("split", 2) => format!(
            "[&]() {{ std::vector<std::string> result; std::string s = {}; std::string delim = {}; size_t pos = 0; while ((pos = s.find(delim)) != std::string::npos) {{ result.push_back(s.substr(0, pos)); s.erase(0, pos + delim.length()); }} result.push_back(s); return result; }}()",
            args[0], args[1]
        ),
        ("join", 2) => format!(
            "[&]() {{ std::string result; auto& items = {}; std::string sep = {}; for (size_t i = 0; i < items.size(); ++i) {{ if (i > 0) result += sep; result += items[i]; }} return result; }}()",
            args[0], args[1]
        ),
        ("contains", 2) => format!(
            "(std::string({}).find({}) != std::string::npos)",
            args[0], args[1]
        ),
        ("starts_with", 2) => format!("(std::string({}).rfind({}, 0) == 0)", args[0], args[1]),
        ("ends_with", 2) => format!(
            "[&]() {{ std::string s = {}; std::string suffix = {}; return s.size() >= suffix.size() && s.compare(s.size() - suffix.size(), suffix.size(), suffix) == 0; }}()",
            args[0], args[1]
        ),
        ("replace_all", 3) => format!(
            "[&]() {{ std::string s = {}; std::string from = {}; std::string to = {}; size_t pos = 0; while ((pos = s.find(from, pos)) != std::string::npos) {{ s.replace(pos, from.length(), to); pos += to.length(); }} return s; }}()",
            args[0], args[1], args[2]
        ),

        // Math
        ("abs", 1) => format!("std::abs({})", args[0]),
        ("min", 2) => format!("std::min({}, {})", args[0], args[1]),
        ("max", 2) => format!("std::max({}, {})", args[0], args[1]),
        ("floor", 1) => format!("std::floor({})", args[0]),
        ("ceil", 1) => format!("std::ceil({})", args[0]),
        ("round", 1) => format!("std::round({})", args[0]),
        ("sqrt", 1) => format!("std::sqrt({})", args[0]),
        ("pow", 2) => format!("std::pow({}, {})", args[0], args[1]),
        ("sin", 1) => format!("std::sin({})", args[0]),
        ("cos", 1) => format!("std::cos({})", args[0]),
        ("tan", 1) => format!("std::tan({})", args[0]),
        ("log", 1) => format!("std::log({})", args[0]),
        ("log10", 1) => format!("std::log10({})", args[0]),
        ("exp", 1) => format!("std::exp({})", args[0]),

        // Sequences
        ("sum", 1) => format!(
            "[&]() {{ auto v = {}; return std::accumulate(std::begin(v), std::end(v), 0); }}()",
            args[0]
        ),
        ("product", 1) => format!(
            "[&]() {{ auto v = {}; return std::accumulate(std::begin(v), std::end(v), 1, std::multiplies<int>()); }}()",
            args[0]
        ),
        ("reverse", 1) => format!(
            "[&]() {{ std::vector<int> v({}); std::reverse(v.begin(), v.end()); return v; }}()",
            args[0]
        ),
        ("sort", 1) => format!(
            "[&]() {{ std::vector<int> v({}); std::sort(v.begin(), v.end()); return v; }}()",
            args[0]
        ),
        ("unique", 1) => format!(
            "[&]() {{ std::vector<int> v({}); std::sort(v.begin(), v.end()); v.erase(std::unique(v.begin(), v.end()), v.end()); return v; }}()",
            args[0]
        ),
        ("first", 1) => format!("*std::begin({})", args[0]),
        ("last", 1) => format!("*std::prev(std::end({}))", args[0]),
        ("empty", 1) => format!("(std::begin({}) == std::end({}))", args[0], args[0]),

        // Time
        ("now", 0) => runtime::NOW.to_string(),
        ("timestamp", 0) => "std::chrono::duration_cast<std::chrono::seconds>(std::chrono::system_clock::now().time_since_epoch()).count()".to_string(),
        ("sleep", 1) => format!(
            "[&]() {{ std::this_thread::sleep_for(std::chrono::milliseconds({})); return 0; }}()",
            args[0]
        ),
        ("date", 0) => runtime::TODAY.to_string(),
        ("time", 0) => runtime::CLOCK.to_string(),

        // Randomness
        ("random", 0) => "[&]() { static std::mt19937 gen(std::random_device{}()); static std::uniform_real_distribution<> dis(0.0, 1.0); return dis(gen); }()".to_string(),
        ("random", 2) => format!(
            "[&]() {{ static std::mt19937 gen(std::random_device{{}}()); std::uniform_int_distribution<> dis({}, {}); return dis(gen); }}()",
            args[0], args[1]
        ),

        // Filesystem
        ("exists", 1) => format!("std::filesystem::exists({})", args[0]),
        ("isfile", 1) => format!("std::filesystem::is_regular_file({})", args[0]),
        ("isdir", 1) => format!("std::filesystem::is_directory({})", args[0]),
        ("filesize", 1) => format!("static_cast<long>(std::filesystem::file_size({}))", args[0]),
        ("listdir", 1) => format!(
            "[&]() {{ std::vector<std::string> result; for (const auto& entry : std::filesystem::directory_iterator({})) {{ result.push_back(entry.path().filename().string()); }} return result; }}()",
            args[0]
        ),
        ("basename", 1) => format!("std::filesystem::path({}).filename().string()", args[0]),
        ("dirname", 1) => format!("std::filesystem::path({}).parent_path().string()", args[0]),
        ("extension", 1) => format!("std::filesystem::path({}).extension().string()", args[0]),

        _ => return None,
    };
    Some(out)
}
