//! chatpane protocol
//!
//! Wire types shared by the bridge server and the Stop-hook process.
//! Telegram types cover only the fields the bridge reads or writes.

pub mod hook;
pub mod telegram;

pub use hook::{HookCallback, HookReply, StopHookInput};
pub use telegram::{
    ApiResponse, BotCommand, CallbackQuery, Chat, InlineKeyboardButton, Message, Update,
};
