// Copyright (c) 2024-present, Andrew Werner
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! This crate is a purpose-built skip list intended to serve as the
//! ordered index of an in-memory key/value store.
//!
//! Due to the requirements of that role, this data structure is notable
//! in a few ways:
//!     * Duplicate keys are permitted and coexist as separate nodes
//!     * Removal takes a handle to the node to unlink, not a key
//!     * Predecessor lookup (`find_last_less_than`) is a first-class
//!       operation
//!
//! The structure is single-threaded: mutation takes `&mut self` and no
//! internal synchronization exists. Callers that share a list across
//! threads must impose their own locking. Nodes live in an index arena
//! owned by the list, with slot `0` reserved for the head sentinel that
//! terminates every chain, so teardown reclaims every node and removal
//! reclaims exactly the node it unlinks.

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::needless_lifetimes)]

mod arena;
mod skiplist;

pub use skiplist::{Entry, Error, Iter, NodeRef, SkipList, MAX_HEIGHT};
