//! nimbus-lib: resource graph synthesis for Nimbus projects
//!
//! This crate turns serverless function declarations into per-stage
//! deployment templates:
//! - `declaration`: the serde schema describing functions, triggers and stores
//! - `synth`: the `BuildContext` that synthesizes resources stage by stage
//! - `resource`: the closed set of template resources and their collections
//! - `template`: CloudFormation rendering and deployment ordering
//! - `state`: the build state handed to the deployer
//! - `client`: runtime clients used by deployed handlers

pub mod client;
pub mod config;
pub mod consts;
pub mod declaration;
pub mod diagnostic;
pub mod document;
pub mod resource;
pub mod stage;
pub mod state;
pub mod synth;
pub mod template;
pub mod util;
