#![forbid(unsafe_code)]

//! Tonebox Widgets
//!
//! Input widgets and prompts that edit a song document.
//!
//! # Role in Tonebox
//! - [`number_input::NumberInput`]: a text field that only settles on an
//!   integer inside its bounds.
//! - [`listeners::ListenerRegistry`]: the dispatch table prompts register
//!   their handlers in.
//! - [`modal`]: open/close state and Escape handling shared by prompts.
//! - [`channel_settings::ChannelSettingsPrompt`]: the channel settings
//!   dialog.
//!
//! Widgets talk to the document only through
//! [`tonebox_song::DocumentHost`].

pub mod channel_settings;
pub mod listeners;
pub mod modal;
pub mod number_input;

pub use channel_settings::{
    ChannelSettingsPrompt, FieldId, FieldSpec, PromptAction, PromptError, PromptField,
    PromptOutcome, PromptState, Target,
};
pub use listeners::{Listener, ListenerId, ListenerKind, ListenerRegistry};
pub use modal::{ModalAction, ModalState, PromptConfig};
pub use number_input::{KeyFilter, NumberInput};
