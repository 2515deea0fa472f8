#![forbid(unsafe_code)]

//! Core: normalized input events for Tonebox editing surfaces.
//!
//! # Role in Tonebox
//! `tonebox-core` is the input layer. Hosts translate whatever their toolkit
//! delivers (browser events, terminal bytes, test scripts) into the
//! [`event::Event`] values defined here, and the widgets in
//! `tonebox-widgets` consume only those. No widget depends on a particular
//! UI toolkit.

pub mod event;

pub use event::{
    Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    PasteEvent,
};
