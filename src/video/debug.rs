//! Messages of the driver debug output.
//!
//! The device collects messages while commands are executed, the context
//! drains them afterwards and decides what to do with each of them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered from the least to the most important.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

impl DebugSeverity {
    pub const VARIANTS: [DebugSeverity; 4] = [
        DebugSeverity::Notification,
        DebugSeverity::Low,
        DebugSeverity::Medium,
        DebugSeverity::High,
    ];

    /// Returns true if messages of this severity pass a filter installed with
    /// the minimum severity `min`.
    #[inline]
    pub fn is_reported(self, min: DebugSeverity) -> bool {
        self >= min
    }
}

impl fmt::Display for DebugSeverity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let v = match *self {
            DebugSeverity::Notification => "note",
            DebugSeverity::Low => "low",
            DebugSeverity::Medium => "medium",
            DebugSeverity::High => "high",
        };

        f.write_str(v)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DebugSource {
    Api,
    WindowSystem,
    ShaderCompiler,
    ThirdParty,
    Application,
    Other,
}

impl fmt::Display for DebugSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let v = match *self {
            DebugSource::Api => "OpenGL",
            DebugSource::WindowSystem => "Windows",
            DebugSource::ShaderCompiler => "Shader Compiler",
            DebugSource::ThirdParty => "Third Party",
            DebugSource::Application => "Application",
            DebugSource::Other => "Other",
        };

        f.write_str(v)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DebugCategory {
    Error,
    DeprecatedBehavior,
    UndefinedBehavior,
    Portability,
    Performance,
    Other,
}

impl fmt::Display for DebugCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let v = match *self {
            DebugCategory::Error => "error",
            DebugCategory::DeprecatedBehavior => "deprecated behavior",
            DebugCategory::UndefinedBehavior => "undefined behavior",
            DebugCategory::Portability => "portability",
            DebugCategory::Performance => "performance",
            DebugCategory::Other => "message",
        };

        f.write_str(v)
    }
}

/// What the context does with a drained message.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Disposition {
    /// Aborts the current operation with `Error::Driver`.
    Fatal,
    Info,
    Warning,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DebugMessage {
    pub source: DebugSource,
    pub category: DebugCategory,
    pub severity: DebugSeverity,
    pub id: u32,
    pub text: String,
}

impl DebugMessage {
    pub fn disposition(&self) -> Disposition {
        match self.category {
            DebugCategory::Error | DebugCategory::UndefinedBehavior => Disposition::Fatal,
            DebugCategory::Performance => Disposition::Info,
            _ => Disposition::Warning,
        }
    }
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {}({}) {}: {}",
            self.source, self.category, self.severity, self.id, self.text
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn message(category: DebugCategory) -> DebugMessage {
        DebugMessage {
            source: DebugSource::Api,
            category,
            severity: DebugSeverity::High,
            id: 1282,
            text: "GL_INVALID_OPERATION in glDrawArrays".into(),
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", message(DebugCategory::Error)),
            "OpenGL: error(high) 1282: GL_INVALID_OPERATION in glDrawArrays"
        );

        let mut msg = message(DebugCategory::Other);
        msg.source = DebugSource::ShaderCompiler;
        msg.severity = DebugSeverity::Notification;
        assert_eq!(
            format!("{}", msg),
            "Shader Compiler: message(note) 1282: GL_INVALID_OPERATION in glDrawArrays"
        );
    }

    #[test]
    fn disposition() {
        assert_eq!(message(DebugCategory::Error).disposition(), Disposition::Fatal);
        assert_eq!(
            message(DebugCategory::UndefinedBehavior).disposition(),
            Disposition::Fatal
        );
        assert_eq!(
            message(DebugCategory::Performance).disposition(),
            Disposition::Info
        );
        assert_eq!(
            message(DebugCategory::Portability).disposition(),
            Disposition::Warning
        );
        assert_eq!(
            message(DebugCategory::DeprecatedBehavior).disposition(),
            Disposition::Warning
        );
    }

    #[test]
    fn severity_filter() {
        assert!(DebugSeverity::High.is_reported(DebugSeverity::Notification));
        assert!(DebugSeverity::Medium.is_reported(DebugSeverity::Medium));
        assert!(!DebugSeverity::Low.is_reported(DebugSeverity::Medium));

        let reported = DebugSeverity::VARIANTS
            .iter()
            .filter(|v| v.is_reported(DebugSeverity::Low))
            .count();
        assert_eq!(reported, 3);
    }
}
