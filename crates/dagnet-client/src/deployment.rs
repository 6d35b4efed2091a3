//! Named deployments: the three public networks plus custom targets.
//!
//! A deployment is an explicit value passed to every client; there is no
//! process-wide configuration singleton.

use serde::{Deserialize, Serialize};

/// One network target: a name and the three HTTP layer base URLs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Human-readable deployment name ("production", "test", …).
    pub name: String,
    /// Block-explorer base URL.
    pub be_url: String,
    /// Global-consensus (L0) base URL.
    pub l0_url: String,
    /// DAG-token (L1) base URL.
    pub l1_url: String,
}

impl Deployment {
    /// The production network.
    pub fn production() -> Self {
        Self {
            name: "production".into(),
            be_url: "https://be.mainnet.dagnet.io".into(),
            l0_url: "https://l0.mainnet.dagnet.io".into(),
            l1_url: "https://l1.mainnet.dagnet.io".into(),
        }
    }

    /// The public test network.
    pub fn test() -> Self {
        Self {
            name: "test".into(),
            be_url: "https://be.testnet.dagnet.io".into(),
            l0_url: "https://l0.testnet.dagnet.io".into(),
            l1_url: "https://l1.testnet.dagnet.io".into(),
        }
    }

    /// The integration network.
    pub fn integration() -> Self {
        Self {
            name: "integration".into(),
            be_url: "https://be.integration.dagnet.io".into(),
            l0_url: "https://l0.integration.dagnet.io".into(),
            l1_url: "https://l1.integration.dagnet.io".into(),
        }
    }

    /// An arbitrary target, e.g. a local node or a private metagraph stack.
    pub fn custom(
        name: impl Into<String>,
        be_url: impl Into<String>,
        l0_url: impl Into<String>,
        l1_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            be_url: trim_slash(be_url.into()),
            l0_url: trim_slash(l0_url.into()),
            l1_url: trim_slash(l1_url.into()),
        }
    }

    pub fn be(&self, path: &str) -> String {
        format!("{}{path}", self.be_url)
    }

    pub fn l0(&self, path: &str) -> String {
        format!("{}{path}", self.l0_url)
    }

    pub fn l1(&self, path: &str) -> String {
        format!("{}{path}", self.l1_url)
    }
}

fn trim_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_deployments_have_three_layers() {
        for d in [
            Deployment::production(),
            Deployment::test(),
            Deployment::integration(),
        ] {
            assert!(d.be_url.starts_with("https://"));
            assert!(d.l0_url.starts_with("https://"));
            assert!(d.l1_url.starts_with("https://"));
        }
    }

    #[test]
    fn custom_trims_trailing_slashes() {
        let d = Deployment::custom("local", "http://127.0.0.1:8080/", "http://x/", "http://y");
        assert_eq!(d.be("/transactions"), "http://127.0.0.1:8080/transactions");
        assert_eq!(d.l0("/node/info"), "http://x/node/info");
    }
}
