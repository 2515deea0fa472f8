#![forbid(unsafe_code)]

//! Scripted walk through the channel settings dialog.
//!
//! Run with `TONEBOX_LOG=debug cargo run -p tonebox --example channel_settings`
//! to see the prompt and history events.

use tonebox::prelude::*;

fn type_text(
    prompt: &mut ChannelSettingsPrompt,
    doc: &mut SongDocument,
    field: FieldId,
    text: &str,
) -> Result<()> {
    let target = Target::Field(field);
    prompt.handle_event(doc, target, &Event::Focus(true))?;
    for c in text.chars() {
        prompt.handle_event(doc, target, &Event::key(KeyCode::Char(c)))?;
    }
    prompt.handle_event(doc, target, &Event::Focus(false))?;
    Ok(())
}

fn summary(song: &Song) -> String {
    format!(
        "pitch={} noise={} patterns={} instruments={}",
        song.pitch_channel_count,
        song.noise_channel_count,
        song.patterns_per_channel,
        song.instruments_per_channel,
    )
}

fn main() -> Result<()> {
    tonebox::logging::init()?;

    let mut doc = SongDocument::default();
    println!("start:     {}", summary(doc.song()));

    // Values past the bounds are clamped when the field loses focus.
    let mut prompt = tonebox::open_channel_settings(&mut doc)?;
    type_text(&mut prompt, &mut doc, FieldId::PitchChannels, "9")?;
    type_text(&mut prompt, &mut doc, FieldId::PatternsPerChannel, "12.7")?;
    let outcome = prompt.handle_event(&mut doc, Target::OkayButton, &Event::click())?;
    println!("confirmed: {} ({outcome:?})", summary(doc.song()));

    // A cancelled dialog leaves the song as it was.
    let mut prompt = tonebox::open_channel_settings(&mut doc)?;
    type_text(&mut prompt, &mut doc, FieldId::NoiseChannels, "3")?;
    prompt.handle_focused_event(&mut doc, &Event::key(KeyCode::Escape))?;
    println!("cancelled: {}", summary(doc.song()));

    doc.undo();
    println!("undone:    {}", summary(doc.song()));
    doc.redo();
    println!("redone:    {}", summary(doc.song()));
    Ok(())
}
