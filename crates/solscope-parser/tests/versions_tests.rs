use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use semver::{Version, VersionReq};
use solscope_core::traits::VersionSource;
use solscope_core::{Error, Result};
use solscope_parser::{next_candidate, InstallableVersions, StaticVersions};

struct CountingSource {
    calls: Arc<AtomicUsize>,
    fail_first: bool,
}

impl VersionSource for CountingSource {
    fn fetch(&self) -> Result<Vec<Version>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && call == 0 {
            return Err(Error::Other("rede indisponível".into()));
        }
        Ok(["0.8.19", "0.7.6", "0.8.0", "0.4.26", "0.8.19", "0.7.0"]
            .iter()
            .map(|v| Version::parse(v).unwrap())
            .collect())
    }
}

fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
}

#[test]
fn versions_are_fetched_once_and_sorted() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = InstallableVersions::new(CountingSource { calls: calls.clone(), fail_first: false });
    assert!(!registry.is_initialized());

    let versions = registry.versions().unwrap();
    assert_eq!(versions, &[v("0.4.26"), v("0.7.0"), v("0.7.6"), v("0.8.0"), v("0.8.19")]);

    registry.versions().unwrap();
    registry.latest_matching(&VersionReq::parse("^0.7").unwrap()).unwrap();
    assert!(registry.is_initialized());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_fetch_is_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = InstallableVersions::new(CountingSource { calls: calls.clone(), fail_first: true });

    assert!(registry.versions().is_err());
    assert!(!registry.is_initialized());
    assert_eq!(registry.versions().unwrap().len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn concurrent_readers_share_one_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(InstallableVersions::new(CountingSource { calls: calls.clone(), fail_first: false }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || registry.versions().map(|v| v.len()).unwrap_or(0))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 5);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn version_detection_from_pragma() {
    let registry = InstallableVersions::new(StaticVersions(vec![
        v("0.6.12"),
        v("0.7.6"),
        v("0.8.0"),
        v("0.8.21"),
        v("0.9.0"),
    ]));

    let source = "// SPDX-License-Identifier: MIT\npragma solidity >=0.7.0 <0.9.0;\ncontract A {}\n";
    let candidates = registry.candidates(source).unwrap();
    assert_eq!(candidates, vec![&v("0.7.6"), &v("0.8.0"), &v("0.8.21")]);
    assert_eq!(registry.detect_version(source).unwrap(), Some(v("0.8.21")));

    let pinned = "pragma solidity 0.7.6;\npragma solidity ^0.7.0;\n";
    assert_eq!(registry.detect_version(pinned).unwrap(), Some(v("0.7.6")));

    assert_eq!(registry.detect_version("contract A {}").unwrap(), None);
    assert!(registry.candidates("pragma solidity ^0.5.0;").unwrap().is_empty());
}

#[test]
fn fallback_walks_down_candidates() {
    let candidates: Vec<Version> = vec![v("0.7.0"), v("0.7.6"), v("0.8.0"), v("0.8.4")];

    let (next, rest) = next_candidate(&v("0.8.4"), &candidates).unwrap();
    assert_eq!(next, v("0.7.0"));
    assert!(rest.is_empty());

    let (next, rest) = next_candidate(&v("0.8.4"), &[v("0.8.0"), v("0.8.2")]).unwrap();
    assert_eq!(next, v("0.8.2"));
    assert_eq!(rest, vec![v("0.8.0")]);

    assert!(next_candidate(&v("0.8.4"), &[]).unwrap_err().is_missing());
}
