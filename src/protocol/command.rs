#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    ConfigLoad,
    ConfigSave,
    TextTokenize,
    TextCheck,
    StringsCollect,
    StringsSave,
    TranslateText,
    TranslateEntries,
    RunQa,
    ModsScan,
    ModsExtract,
    ModsListExtracted,
    ModsPack,
    BatchTranslate,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "config.load" => Command::ConfigLoad,
            "config.save" => Command::ConfigSave,
            "text.tokenize" => Command::TextTokenize,
            "text.check" => Command::TextCheck,
            "strings.collect" => Command::StringsCollect,
            "strings.save" => Command::StringsSave,
            "translate.text" => Command::TranslateText,
            "translate.entries" => Command::TranslateEntries,
            "run_qa" => Command::RunQa,
            "mods.scan" => Command::ModsScan,
            "mods.extract" => Command::ModsExtract,
            "mods.list_extracted" => Command::ModsListExtracted,
            "mods.pack" => Command::ModsPack,
            "batch.translate" => Command::BatchTranslate,
            _ => Command::Unknown,
        }
    }
}
