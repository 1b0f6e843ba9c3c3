//! Discord integration - gateway bot interface
//!
//! This crate provides the Discord interface for freshcut:
//! - **Gateway** (`gateway`) - event-stream loop with reconnect policy
//! - **Slash Commands** (`commands`) - `/spell_lookup`, `/multipoll`, etc.
//! - **Events** (`events`) - command dispatch, message reactions, buttons
//! - **Messages** (`messages`) - typed embed/message payload builders
//! - **Services** (`service`, `reminders`) - the flows behind the commands
//!
//! # Architecture
//!
//! ```text
//! Gateway Events → EventDispatcher → Handlers → BotService → Core
//!                       ↓
//!                 Embed payloads ← Response
//! ```
//!
//! The platform itself is reached only through the `GatewayTransport`,
//! `ChannelApi`, `PageFetcher`, and `CalendarSource` seams, so every flow
//! runs against scripted fakes in tests.

pub mod channel;
pub mod commands;
pub mod events;
pub mod gateway;
pub mod messages;
pub mod reminders;
pub mod service;
