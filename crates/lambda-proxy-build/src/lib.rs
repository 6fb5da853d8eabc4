//! Build context, Dockerfile and packaging script generation for lambda-proxy.
//!
//! # Package pipeline
//!
//! ```text
//! lambda-proxy package
//!   1. Dirty check  ── git status --porcelain (skip with --allow-dirty)
//!   2. Dockerfile   ── ejected .lambda-proxy/Dockerfile or DockerfileGenerator::render()
//!   3. Script       ── project script, ejected script, or ScriptGenerator::render()
//!   4. Bundle       ── git ls-files → .lambda-proxy-bundle/
//!   5. Container    ── docker build / run / exec / stop / rm
//! ```
//!
//! # Bundle strategy
//!
//! The bundle mirrors the git repository state of the workspace root:
//! - All tracked and untracked (non-ignored) files via `git ls-files`
//! - `.gitignore`d paths are excluded automatically
//! - `.lambda-proxy-bundle/`, `.lambda-proxy/`, `.git/` are always excluded

pub mod bundle;
pub mod dockerfile;
pub mod eject;
pub mod script;

pub use dockerfile::DockerfileGenerator;
pub use script::{ScriptGenerator, ScriptSource};
