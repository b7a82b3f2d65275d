//! Shared UI icons and emojis.
//!
//! Falls back to ASCII tags on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Project indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static GOAL: Emoji<'_, '_> = Emoji("🎯 ", "[GOAL]");
pub static NEXT: Emoji<'_, '_> = Emoji("➡️  ", "[NEXT]");
pub static PENDING: Emoji<'_, '_> = Emoji("📋 ", "[TODO]");
pub static CHECKPOINT: Emoji<'_, '_> = Emoji("📍 ", "#");

// Version control
pub static COMMIT: Emoji<'_, '_> = Emoji("📝 ", "[COMMIT]");
pub static PUSH: Emoji<'_, '_> = Emoji("🚀 ", "[PUSH]");
