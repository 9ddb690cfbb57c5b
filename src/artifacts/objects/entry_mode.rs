#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
}

#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Directory,
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode::File(FileMode::Regular)
    }
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode {mode}"))?;

        EntryMode::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 | 0o100664 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Unsupported entry mode {mode:o}")),
        }
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}
