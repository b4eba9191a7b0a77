#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    BatchesList,
    DatasetAppend,
    DatasetCheck,
    DatasetStats,
    VoicesConvert,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "batches.list" => Command::BatchesList,
            "dataset.append" => Command::DatasetAppend,
            "dataset.check" => Command::DatasetCheck,
            "dataset.stats" => Command::DatasetStats,
            "voices.convert" => Command::VoicesConvert,
            _ => Command::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_to_commands() {
        assert_eq!(Command::from("ping"), Command::Ping);
        assert_eq!(Command::from("dataset.append"), Command::DatasetAppend);
        assert_eq!(Command::from("voices.convert"), Command::VoicesConvert);
        assert_eq!(Command::from("project.open"), Command::Unknown);
        assert_eq!(Command::from(""), Command::Unknown);
    }
}
