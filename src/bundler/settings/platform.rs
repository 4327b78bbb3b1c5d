//! Operating system and machine labels.

/// Host facts used for naming and marker evaluation.
///
/// # Examples
///
/// ```
/// use standalone_bundler::bundler::Platform;
///
/// let platform = Platform::from_system("Darwin", "arm64");
/// assert_eq!(platform.os, "osx");
/// assert_eq!(platform.marker_platform, "darwin");
/// assert_eq!(platform.os_title(), "OSX");
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Platform {
    /// Normalized operating system label (`linux`, `windows`, `osx`, ...).
    pub os: String,
    /// Lower-cased machine type (`x86_64`, `amd64`, `arm64`, ...).
    pub machine: String,
    /// Platform name environment markers are compared against.
    pub marker_platform: String,
}

impl Platform {
    /// Builds labels from a system name as reported by the OS (`Linux`,
    /// `Darwin`, `Windows`) and a machine type.
    pub fn from_system(system: &str, machine: &str) -> Self {
        let system = system.to_lowercase();
        let marker_platform = match system.as_str() {
            "macos" | "darwin" => "darwin".to_string(),
            other => other.to_string(),
        };
        let os = match marker_platform.as_str() {
            "darwin" => "osx".to_string(),
            other => other.to_string(),
        };
        Self {
            os,
            machine: machine.to_lowercase(),
            marker_platform,
        }
    }

    /// Detects the host platform.
    pub fn current() -> Self {
        let machine = match (std::env::consts::OS, std::env::consts::ARCH) {
            ("windows", "x86_64") => "amd64",
            ("macos", "aarch64") => "arm64",
            (_, arch) => arch,
        };
        Self::from_system(std::env::consts::OS, machine)
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// OS label as shown in human readable labels: title-cased, `OSX` upper-cased.
    pub fn os_title(&self) -> String {
        if self.os == "osx" {
            self.os.to_uppercase()
        } else {
            crate::bundler::naming::title_case(&self.os)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_labels() {
        let platform = Platform::from_system("Linux", "X86_64");
        assert_eq!(platform.os, "linux");
        assert_eq!(platform.machine, "x86_64");
        assert_eq!(platform.marker_platform, "linux");
        assert_eq!(platform.os_title(), "Linux");
        assert!(!platform.is_windows());
    }

    #[test]
    fn test_macos_is_aliased() {
        let platform = Platform::from_system("macos", "aarch64");
        assert_eq!(platform.os, "osx");
        assert_eq!(platform.marker_platform, "darwin");
    }

    #[test]
    fn test_current_is_normalized() {
        let platform = Platform::current();
        assert_eq!(platform.os, platform.os.to_lowercase());
        assert_ne!(platform.os, "macos");
        assert!(!platform.machine.is_empty());
    }
}
