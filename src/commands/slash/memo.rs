//! Memo slash commands: /memo, /list, /delete, /setchannel

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;
use serenity::model::channel::ChannelType;

/// Longest memo body accepted by /memo
pub const MAX_CONTENT_LENGTH: u16 = 1500;

pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_memo_command(),
        create_list_command(),
        create_delete_command(),
        create_setchannel_command(),
    ]
}

fn create_memo_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("memo")
        .description("Schedule a memo to be posted later")
        .create_option(|option| {
            option
                .name("content")
                .description("What the memo should say")
                .kind(CommandOptionType::String)
                .max_length(MAX_CONTENT_LENGTH)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("when")
                .description("e.g. 'in 2 hours', '30m', 'tomorrow at 3pm', 'friday 9am'")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("channel")
                .description("Post the memo here instead of the current channel")
                .kind(CommandOptionType::Channel)
                .channel_types(&[ChannelType::Text])
                .required(false)
        })
        .to_owned()
}

fn create_list_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("list")
        .description("Show pending memos for this channel and your totals elsewhere")
        .to_owned()
}

fn create_delete_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("delete")
        .description("Delete one of your pending memos")
        .create_option(|option| {
            option
                .name("id")
                .description("Memo number shown by /list")
                .kind(CommandOptionType::Integer)
                .min_int_value(1)
                .required(true)
        })
        .to_owned()
}

fn create_setchannel_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("setchannel")
        .description("Deliver memos you create in DMs to this channel")
        .dm_permission(false)
        .to_owned()
}
