#![recursion_limit = "1024"]
#![allow(renamed_and_removed_lints)]
#![allow(non_snake_case)]

#[macro_use]
extern crate serde_derive;
extern crate serde;
extern crate serde_json;

#[macro_use]
extern crate log;

extern crate reqwest;
extern crate url;

#[cfg(feature = "filesystem")]
extern crate dirs;

#[cfg(test)]
#[macro_use]
extern crate maplit;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {}
    foreign_links {
        Fmt(::std::fmt::Error);
        Io(::std::io::Error) #[cfg(unix)];
        SerdeJ(serde_json::Error);
        Reqe(reqwest::Error);
        UrlP(url::ParseError);
    }
    errors {
        MissingRegistryAddr {
            description("REGISTRY_ADDR not specified")
            display("REGISTRY_ADDR not specified")
        }
        MissingRegistryToken {
            description("REGISTRY_TOKEN not specified")
            display("REGISTRY_TOKEN not specified")
        }
        NoHomeDirectory {
            description("can't find home directory")
            display("can't find home directory")
        }
        UnexpectedHttpStatus(status: reqwest::StatusCode) {
            description("unexpected HTTP status")
            display("unexpected HTTP status: {}", &status)
        }
        Url(url: reqwest::Url) {
            description("could not access URL")
            display("could not access URL '{}'", &url)
        }
        PathNotFound(path: String) {
            description("registry path does not exist")
            display("nothing stored at '{}'", &path)
        }
        InvalidSettings(field: String) {
            description("job settings do not validate")
            display("job settings have an invalid '{}'", &field)
        }
        InvalidDocument(path: String) {
            description("settings document does not decode")
            display("settings document at '{}' does not match the expected form", &path)
        }
    }
}

/// The settings record stored per job
pub mod settings;
pub use settings::JobSettings;

/// Coordination registry interface and the shipped backends
pub mod registry;
pub use registry::{HttpRegistry, MemoryRegistry, Registry, RegistryConfig};

mod client;
pub use client::SettingsClient;
