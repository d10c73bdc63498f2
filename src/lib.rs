//! # vscch - VS Code C/C++ configuration helper
//!
//! vscch finds a working GCC or Clang, picks the newest language standard it
//! supports, and writes a ready-to-use `.vscode` folder: build and run
//! tasks, a debug launch configuration and IntelliSense settings.
//!
//! ## Quick Start
//!
//! ```bash
//! # Configure the current folder, answering yes to everything
//! vscch configure -w . -y
//!
//! # Undo the helper scripts
//! vscch remove-scripts
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - The configuration request, its validation and profiles
//! - [`standard`] - Compiler version to language standard tables
//! - [`toolchain`] - Compiler discovery and selection
//! - [`ide`] - `.vscode` documents, helper scripts and keybindings
//! - [`commands`] - CLI command handlers

/// CLI command handlers.
pub mod commands;

/// Configuration requests (`Options`) and TOML profiles.
pub mod config;

/// Locating VS Code.
pub mod editor;

/// VS Code extension management.
pub mod extensions;

/// VS Code configuration generation.
pub mod ide;

/// Child processes with a deadline.
pub mod process;

/// Interactive questions.
pub mod prompt;

/// Language standards and per-compiler support tables.
pub mod standard;

/// Local anonymous usage log.
pub mod telemetry;

/// Toolchain detection and validation.
pub mod toolchain;

/// Terminal UI utilities (tables).
pub mod ui;
