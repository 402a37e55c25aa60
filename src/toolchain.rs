//! Native-toolchain driver: persists generated C++ and shells out to the
//! configured compiler. The tool is opaque to us — it is judged only by its
//! exit status and captured output.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::diagnostics::CompileError;

pub struct Toolchain {
    cfg: Config,
}

impl Toolchain {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Compile generated C++ inside a scratch directory and execute the
    /// result with the caller's standard streams attached. Returns the
    /// program's own exit code. The scratch directory is removed on every
    /// exit path.
    pub fn compile_and_run(&self, cpp_code: &str, flow_file: &Path) -> Result<i32, CompileError> {
        let dir = tempfile::Builder::new()
            .prefix("flow-")
            .tempdir()
            .map_err(|e| CompileError::io(format!("failed to create temp dir: {e}")))?;

        let base = base_name(flow_file);
        let cpp_file = dir.path().join(format!("{base}.cpp"));
        let bin_file = dir.path().join(&base);

        std::fs::write(&cpp_file, cpp_code)
            .map_err(|e| CompileError::io(format!("failed to write cpp file: {e}")))?;

        self.compile_source(&cpp_file, &bin_file)?;

        let status = Command::new(&bin_file)
            .status()
            .map_err(|e| CompileError::io(format!("could not run compiled binary: {e}")))?;

        Ok(status.code().unwrap_or(1))
    }

    /// Compile beside the source file and return the binary path. The
    /// intermediate .cpp is removed unless `keep_cpp` is set.
    pub fn compile(
        &self,
        cpp_code: &str,
        flow_file: &Path,
        keep_cpp: bool,
    ) -> Result<PathBuf, CompileError> {
        let dir = flow_file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let base = base_name(flow_file);
        let cpp_file = dir.join(format!("{base}.cpp"));
        let bin_file = dir.join(&base);

        std::fs::write(&cpp_file, cpp_code)
            .map_err(|e| CompileError::io(format!("failed to write cpp file: {e}")))?;

        let compiled = self.compile_source(&cpp_file, &bin_file);

        if !keep_cpp {
            let _ = std::fs::remove_file(&cpp_file);
        }
        compiled?;

        Ok(bin_file)
    }

    fn compile_source(&self, cpp_file: &Path, bin_file: &Path) -> Result<(), CompileError> {
        let output = Command::new(&self.cfg.compiler)
            .arg(format!("-std={}", self.cfg.cpp_std))
            .arg("-o")
            .arg(bin_file)
            .arg(cpp_file)
            .arg("-pthread") // std::thread and std::async
            .arg("-lssl")
            .arg("-lcrypto")
            .output()
            .map_err(|e| {
                CompileError::io(format!("failed to invoke {}: {e}", self.cfg.compiler))
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(CompileError::build(text));
        }

        Ok(())
    }
}

fn base_name(flow_file: &Path) -> String {
    let name = flow_file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());
    name.strip_suffix(".flow").map(str::to_string).unwrap_or(name)
}
