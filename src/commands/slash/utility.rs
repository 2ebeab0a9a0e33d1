//! Utility slash commands: /help

use serenity::builder::CreateApplicationCommand;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![CreateApplicationCommand::default()
        .name("help")
        .description("Explain memo commands and time formats")
        .to_owned()]
}
