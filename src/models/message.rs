use std::fmt;

/// Block separator placed after every message in a rendered report.
pub const SEPARATOR: &str = "-----";

/// Severity carried by a message's leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Plain text such as banners and notices
    Info,
    /// `✔️` marker
    Success,
    /// `❌ WARNING` / `[!]` marker
    Warning,
    /// `❌ CAUTION` marker
    Caution,
}

impl Severity {
    /// Infer the severity of preformatted text (e.g. warnings shipped in the YAML databases).
    pub fn classify(text: &str) -> Self {
        let head = text.trim_start();
        if head.starts_with('✔') {
            Severity::Success
        } else if head.contains("CAUTION") && (head.starts_with('❌') || head.starts_with("[!]") || head.starts_with('#')) {
            Severity::Caution
        } else if head.starts_with('❌') || head.starts_with("[!]") || head.starts_with("#❌") || head.starts_with("ERROR >") {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    pub fn is_problem(self) -> bool {
        matches!(self, Severity::Warning | Severity::Caution)
    }
}

/// One block of report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub text: String,
}

impl DiagnosticMessage {
    /// Wrap preformatted text, deriving the severity from its marker.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            severity: Severity::classify(&text),
            text,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl AsRef<str>) -> Self {
        Self {
            severity: Severity::Success,
            text: format!("✔️ {}", text.as_ref()),
        }
    }

    pub fn warning(text: impl AsRef<str>) -> Self {
        Self {
            severity: Severity::Warning,
            text: format!("❌ WARNING : {}", text.as_ref()),
        }
    }

    pub fn caution(text: impl AsRef<str>) -> Self {
        Self {
            severity: Severity::Caution,
            text: format!("❌ CAUTION : {}", text.as_ref()),
        }
    }

    /// `[!] CAUTION` flavour used for files that need operator action.
    pub fn notice(text: impl AsRef<str>) -> Self {
        Self {
            severity: Severity::Caution,
            text: format!("[!] CAUTION : {}", text.as_ref()),
        }
    }

    /// A single `ERROR > line` entry listed under a banner.
    pub fn failure_line(line: &str) -> Self {
        Self {
            severity: Severity::Warning,
            text: format!("ERROR > {}", line.trim()),
        }
    }

    pub fn is_problem(&self) -> bool {
        self.severity.is_problem()
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n", self.text.trim_end(), SEPARATOR)
    }
}
