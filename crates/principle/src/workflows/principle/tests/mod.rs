mod asset;
mod common;
