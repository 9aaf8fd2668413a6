//! Class 文件头定义
//!
//! Magic (4 bytes) + minor_version (2 bytes) + major_version (2 bytes)

use super::error::DecodeError;

/// 文件头魔数
pub const MAGIC: u32 = 0xCAFE_BABE;

/// 支持的最低主版本号 (JDK 1.1)
pub const MIN_MAJOR_VERSION: u16 = 45;

/// 支持的最高主版本号 (JDK 25)
pub const MAX_MAJOR_VERSION: u16 = 69;

/// Class 文件版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassVersion {
    pub minor: u16,
    pub major: u16,
}

impl ClassVersion {
    /// Java 8 (52.0)
    pub const JAVA_8: ClassVersion = ClassVersion {
        minor: 0,
        major: 52,
    };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { minor, major }
    }

    /// 验证版本号是否在支持范围内
    pub fn validate(&self) -> Result<(), DecodeError> {
        if (MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&self.major) {
            Ok(())
        } else {
            Err(DecodeError::UnsupportedVersion {
                major: self.major,
                minor: self.minor,
            })
        }
    }
}

impl std::fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_range() {
        assert!(ClassVersion::new(45, 3).validate().is_ok());
        assert!(ClassVersion::JAVA_8.validate().is_ok());
        assert!(ClassVersion::new(69, 0).validate().is_ok());
        assert_eq!(
            ClassVersion::new(44, 0).validate(),
            Err(DecodeError::UnsupportedVersion { major: 44, minor: 0 })
        );
        assert!(ClassVersion::new(70, 0).validate().is_err());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(ClassVersion::JAVA_8.to_string(), "52.0");
    }
}
