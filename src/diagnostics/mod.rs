use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error at {line}:{column}: {msg}")]
    Lex { msg: String, line: u32, column: u32 },

    #[error("parse error at {line}:{column}: {msg}")]
    Parse { msg: String, line: u32, column: u32 },

    #[error("build failed:\n{output}")]
    Build { output: String },

    #[error("{msg}")]
    Io { msg: String },
}

impl CompileError {
    pub fn lex(msg: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Lex { msg: msg.into(), line, column }
    }

    pub fn parse(msg: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Parse { msg: msg.into(), line, column }
    }

    pub fn build(output: impl Into<String>) -> Self {
        Self::Build { output: output.into() }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io { msg: msg.into() }
    }
}

/// Render a CompileError with ariadne for nice terminal output. Lex and parse
/// errors get a labeled source listing; everything else prints raw.
pub fn render_error(source: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Lex { msg, line, column } | CompileError::Parse { msg, line, column } => {
            let kind_str = match err {
                CompileError::Lex { .. } => "lex",
                _ => "parse",
            };
            let offset = byte_offset(source, *line, *column);
            let end = (offset + 1).min(source.len()).max(offset);
            Report::build(ReportKind::Error, (), offset)
                .with_message(format!("{kind_str} error"))
                .with_label(Label::new(offset..end).with_message(msg))
                .finish()
                .eprint(Source::from(source))
                .unwrap();
        }
        CompileError::Build { output } => {
            eprintln!("error: build failed");
            eprintln!("{output}");
        }
        CompileError::Io { msg } => {
            eprintln!("error: {msg}");
        }
    }
}

/// Convert a 1-based line/column position into a byte offset into `source`.
fn byte_offset(source: &str, line: u32, column: u32) -> usize {
    let mut remaining = line.saturating_sub(1);
    let mut offset = 0usize;
    for l in source.split_inclusive('\n') {
        if remaining == 0 {
            let col = column.saturating_sub(1) as usize;
            return (offset + col.min(l.len())).min(source.len());
        }
        offset += l.len();
        remaining -= 1;
    }
    source.len()
}
