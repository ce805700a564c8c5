// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Text processing: display cleanup and fragment splitting

pub mod cleanup;
pub mod splitter;

pub use cleanup::clean_text;
pub use splitter::{Fragment, RecursiveCharacterSplitter, SplitError, DEFAULT_SEPARATORS};
