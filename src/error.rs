// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unknown user '{0}'")]
    UnknownUser(String),
    #[error("Wrong password for '{0}'")]
    WrongPassword(String),
    #[error("User '{0}' already exists")]
    UserExists(String),
    #[error("Invalid username '{0}': use 1-32 characters without '|' or whitespace")]
    InvalidUsername(String),
    #[error("Password must not be empty")]
    EmptyPassword,
    #[error("Session cookie is invalid; please log in again")]
    InvalidCookie,
    #[error("Session expired; please log in again")]
    SessionExpired,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Record {0} not found")]
    EntryNotFound(i64),
    #[error("Amount must not be negative (got {0})")]
    NegativeAmount(String),
    #[error("Unknown column '{0}' (use date|book|category|item|amount|type)")]
    UnknownColumn(String),
    #[error("Unknown entry type '{0}' (use income|expense)")]
    UnknownType(String),
    #[error("Column '{0}' not found in import file")]
    MissingColumn(String),
}
