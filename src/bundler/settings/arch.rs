//! CPU architecture parsed from platform names.

/// CPU architecture of a build platform.
///
/// Platform names carry the architecture spelling of their OS family
/// (`amd64` on Debian, `x86_64` on EL and macOS, `x64` on Windows); this enum
/// normalises them for tools that need a canonical value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 / amd64 / x64
    X86_64,
    /// i386 / i686 / x86
    X86,
    /// aarch64 / arm64
    AArch64,
    /// 32-bit ARM with hard-float
    Armhf,
    /// 64-bit PowerPC little endian
    Ppc64le,
    /// IBM Z
    S390x,
}

impl Arch {
    /// Parses the architecture segment of a platform name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "x86_64" | "amd64" | "x64" => Some(Arch::X86_64),
            "i386" | "i686" | "x86" => Some(Arch::X86),
            "aarch64" | "arm64" => Some(Arch::AArch64),
            "armhf" | "armv7l" | "armv7hl" => Some(Arch::Armhf),
            "ppc64le" => Some(Arch::Ppc64le),
            "s390x" => Some(Arch::S390x),
            _ => None,
        }
    }

    /// WiX `-arch` value.
    pub fn wix_arch(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::AArch64 => "arm64",
            _ => "x64",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_spellings_normalise() {
        assert_eq!(Arch::parse("amd64"), Some(Arch::X86_64));
        assert_eq!(Arch::parse("x86_64"), Some(Arch::X86_64));
        assert_eq!(Arch::parse("arm64"), Some(Arch::AArch64));
        assert_eq!(Arch::parse("sparc"), None);
        assert_eq!(Arch::X86.wix_arch(), "x86");
    }
}
