// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolves which lock backend this build compiles against.
//!
//! The choice comes from at most one of the `pthread`, `shared-lock` and `fallback`
//! features, or from the `SYNC_RWLOCK_BACKEND` environment variable. Contradictory or
//! unsupported selections abort the build; nothing is silently downgraded.

use std::env;
use std::fmt;

const ENV_BACKEND: &str = "SYNC_RWLOCK_BACKEND";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Backend {
    Pthread,
    SharedLock,
    Fallback,
}

impl Backend {
    const ALL: [Backend; 3] = [Backend::Pthread, Backend::SharedLock, Backend::Fallback];

    fn feature_env(self) -> &'static str {
        match self {
            Backend::Pthread => "CARGO_FEATURE_PTHREAD",
            Backend::SharedLock => "CARGO_FEATURE_SHARED_LOCK",
            Backend::Fallback => "CARGO_FEATURE_FALLBACK",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Backend::Pthread => "pthread",
            Backend::SharedLock => "shared-lock",
            Backend::Fallback => "fallback",
        }
    }

    // Value of the `sync_rwlock_backend` cfg.
    fn cfg_value(self) -> &'static str {
        match self {
            Backend::Pthread => "pthread",
            Backend::SharedLock => "shared",
            Backend::Fallback => "fallback",
        }
    }

    fn parse(s: &str) -> Option<Backend> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name() == s.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Target {
    unix: bool,
    os: String,
    threaded_std: bool,
}

impl Target {
    fn from_env() -> Target {
        let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
        let features = env::var("CARGO_CFG_TARGET_FEATURE").unwrap_or_default();
        let has_atomics = features.split(',').any(|f| f == "atomics");
        Target {
            unix: env::var_os("CARGO_CFG_UNIX").is_some(),
            os: env::var("CARGO_CFG_TARGET_OS").unwrap_or_default(),
            // wasm32 std without the atomics feature is single threaded
            threaded_std: !(arch == "wasm32" && !has_atomics),
        }
    }

    fn check(&self, backend: Backend) -> Result<(), String> {
        match backend {
            Backend::Pthread if !self.unix => Err(format!(
                "the `pthread` backend requires a POSIX target, but target_os is `{}`",
                self.os
            )),
            Backend::SharedLock if !self.threaded_std => Err(
                "the `shared-lock` backend requires a target with multi-threaded std \
                 (wasm32 needs the `atomics` target feature)"
                    .to_string(),
            ),
            _ => Ok(()),
        }
    }

    fn default_backend(&self) -> Backend {
        if self.unix {
            Backend::Pthread
        } else if self.threaded_std {
            Backend::SharedLock
        } else {
            Backend::Fallback
        }
    }

    fn links_libpthread(&self) -> bool {
        matches!(
            self.os.as_str(),
            "linux" | "freebsd" | "netbsd" | "openbsd" | "dragonfly" | "solaris" | "illumos"
        )
    }
}

fn resolve(target: &Target) -> Result<Backend, String> {
    let from_features: Vec<Backend> = Backend::ALL
        .into_iter()
        .filter(|b| env::var_os(b.feature_env()).is_some())
        .collect();
    if from_features.len() > 1 {
        let names: Vec<&str> = from_features.iter().map(|b| b.name()).collect();
        return Err(format!(
            "backend features are mutually exclusive, but {} are enabled",
            names.join(", ")
        ));
    }

    let from_env = match env::var(ENV_BACKEND) {
        Ok(value) if value.trim().is_empty() => None,
        Ok(value) => Some(Backend::parse(&value).ok_or_else(|| {
            format!(
                "{ENV_BACKEND}=`{value}` is not a backend; expected one of pthread, shared-lock, fallback"
            )
        })?),
        Err(_) => None,
    };

    let chosen = match (from_features.first().copied(), from_env) {
        (Some(feature), Some(var)) if feature != var => {
            return Err(format!(
                "feature `{feature}` contradicts {ENV_BACKEND}=`{var}`"
            ));
        }
        (Some(b), _) | (None, Some(b)) => b,
        (None, None) => target.default_backend(),
    };
    target.check(chosen)?;
    Ok(chosen)
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={ENV_BACKEND}");
    println!(
        "cargo:rustc-check-cfg=cfg(sync_rwlock_backend, values(\"pthread\", \"shared\", \"fallback\"))"
    );

    let target = Target::from_env();
    let backend = match resolve(&target) {
        Ok(backend) => backend,
        Err(message) => panic!("sync_rwlock: invalid backend configuration: {message}"),
    };

    println!("cargo:rustc-cfg=sync_rwlock_backend=\"{}\"", backend.cfg_value());
    if backend == Backend::Pthread && target.links_libpthread() {
        println!("cargo:rustc-link-lib=pthread");
    }
}
