//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nesting levels). Provides helpers to
//! expand `~` and `${VAR}` and to resolve relative paths against a known base
//! directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::Unit;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&env::current_dir()?)
    }

    pub fn load_from(base_dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment, base_dir: base_dir.to_path_buf() })
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub classifier: ClassifierSettings,
    pub corrector: CorrectorSettings,
}

impl Settings {
    /// Reject configurations the engines cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.classifier.validate()?;
        self.corrector.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Directory holding ingestion output (`*.json` chunk arrays).
    pub corpus_dir: String,
    /// Directory holding the persisted vector index and passage metadata.
    pub index_dir: String,
    /// Cached topic profile embeddings.
    pub profiles_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            corpus_dir: "data/chunks".to_string(),
            index_dir: "data/index".to_string(),
            profiles_path: "data/topic_profiles.json".to_string(),
        }
    }
}

impl DataSettings {
    pub fn corpus_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.corpus_dir)
    }

    pub fn index_dir(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.index_dir)
    }

    pub fn profiles_path(&self, base: &Path) -> PathBuf {
        resolve_with_base(base, &self.profiles_path)
    }
}

/// A canonical phrase appended to queries mentioning `term`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpansion {
    pub term: String,
    pub expansion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_k: usize,
    pub min_score: f32,
    /// `retrieve_by_unit` fetches `k * unit_overfetch` candidates ...
    pub unit_overfetch: usize,
    /// ... but never fewer than this.
    pub min_unit_candidates: usize,
    /// `retrieve_prioritized` fetches `k * source_overfetch` candidates.
    pub source_overfetch: usize,
    pub expansions: Vec<QueryExpansion>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: 5,
            min_score: 0.3,
            unit_overfetch: 4,
            min_unit_candidates: 20,
            source_overfetch: 2,
            expansions: [
                ("tcp", "tcp transmission control protocol"),
                ("handshake", "three way handshake connection establishment"),
                ("routing", "routing algorithm path selection"),
                ("protocol", "network protocol communication"),
            ]
            .into_iter()
            .map(|(term, expansion)| QueryExpansion { term: term.to_string(), expansion: expansion.to_string() })
            .collect(),
        }
    }
}

impl RetrievalSettings {
    fn validate(&self) -> Result<()> {
        if self.unit_overfetch < 4 {
            return Err(Error::InvalidConfig("retrieval.unit_overfetch must be at least 4".to_string()));
        }
        if self.source_overfetch < 1 {
            return Err(Error::InvalidConfig("retrieval.source_overfetch must be at least 1".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.min_score) {
            return Err(Error::InvalidConfig("retrieval.min_score must lie in [-1, 1]".to_string()));
        }
        for e in &self.expansions {
            if e.term.trim().is_empty() || e.expansion.trim().is_empty() {
                return Err(Error::InvalidConfig("retrieval.expansions entries must be non-empty".to_string()));
            }
        }
        Ok(())
    }
}

/// A keyword list attached to one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitKeywords {
    pub unit: Unit,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordBoost {
    pub keyword: String,
    pub boost: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub relevant_threshold: f32,
    pub partial_threshold: f32,
    pub ambiguity_gap: f32,
    pub high_confidence: f32,
    pub medium_confidence: f32,
    /// Out-of-domain denylist; a hit short-circuits to IRRELEVANT.
    pub exclusions: Vec<String>,
    pub boosts: Vec<KeywordBoost>,
    /// Curated keywords per unit, embedded once into the unit's profile.
    pub topics: Vec<UnitKeywords>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            relevant_threshold: 0.28,
            partial_threshold: 0.12,
            ambiguity_gap: 0.08,
            high_confidence: 0.6,
            medium_confidence: 0.35,
            exclusions: strings(&[
                "cryptocurrency", "bitcoin", "blockchain", "mining", "wallet",
                "machine learning", "artificial intelligence",
                "database", "normalization",
                "cooking", "food", "recipe", "pasta",
                "weather", "temperature", "climate",
                "finance", "banking", "stock", "investment",
            ]),
            boosts: [
                ("ip", 0.25), ("tcp", 0.25), ("udp", 0.25), ("http", 0.25), ("ftp", 0.25),
                ("dns", 0.25), ("dhcp", 0.25), ("snmp", 0.25), ("osi", 0.25), ("ethernet", 0.25),
                ("routing", 0.20), ("switching", 0.20), ("protocol", 0.15), ("network", 0.10),
            ]
            .into_iter()
            .map(|(keyword, boost)| KeywordBoost { keyword: keyword.to_string(), boost })
            .collect(),
            topics: unit_table([
                (Unit::Unit1, strings(&[
                    "data communication", "networking", "OSI", "TCP/IP", "protocol architecture",
                    "layered architecture", "reference models", "hosts", "switches", "routers", "gateways",
                ])),
                (Unit::Unit2, strings(&[
                    "physical layer", "data link layer", "DLL", "sublayers", "ethernet", "CSMA/CD",
                    "token ring", "VLAN", "wireless", "bluetooth", "framing", "flow control",
                    "error detection", "collision domain", "CSMA/CA", "IEEE 802.11", "MAC", "LLC",
                    "broadcast networks",
                ])),
                (Unit::Unit3, strings(&[
                    "network layer", "packet switching", "routing", "distance vector", "link state",
                    "RIP", "OSPF", "BGP", "IPv4", "IPv6", "IP addressing", "addressing", "subnetting",
                    "subnet", "CIDR", "VLSM", "DHCP", "NAT", "ICMP", "IP packet format",
                    "effective IP address management",
                ])),
                (Unit::Unit4, strings(&[
                    "transport layer", "TCP", "UDP", "connection establishment", "flow control",
                    "congestion control", "application layer", "HTTP", "HTTPS", "web protocols", "FTP",
                    "email protocols", "DNS", "sockets", "port numbers", "client server",
                ])),
                (Unit::Unit5, strings(&[
                    "network monitoring", "network management", "SNMP", "MIB", "wireshark",
                    "fault detection", "SDN", "control plane", "data plane", "network provisioning",
                ])),
            ]),
        }
    }
}

impl ClassifierSettings {
    fn validate(&self) -> Result<()> {
        let (relevant, partial) = (self.relevant_threshold, self.partial_threshold);
        if !(0.0..=1.0).contains(&partial) || !(0.0..=1.0).contains(&relevant) || partial >= relevant {
            return Err(Error::InvalidConfig(format!(
                "classifier thresholds must satisfy 0 <= partial ({partial}) < relevant ({relevant}) <= 1"
            )));
        }
        if self.medium_confidence >= self.high_confidence {
            return Err(Error::InvalidConfig("classifier.medium_confidence must be below high_confidence".to_string()));
        }
        if self.ambiguity_gap < 0.0 {
            return Err(Error::InvalidConfig("classifier.ambiguity_gap must be non-negative".to_string()));
        }
        if self.exclusions.is_empty() {
            return Err(Error::InvalidConfig("classifier.exclusions must not be empty".to_string()));
        }
        if self.boosts.is_empty() {
            return Err(Error::InvalidConfig("classifier.boosts must not be empty".to_string()));
        }
        if let Some(b) = self.boosts.iter().find(|b| !b.boost.is_finite() || b.boost < 0.0) {
            return Err(Error::InvalidConfig(format!("boost for '{}' must be a non-negative number", b.keyword)));
        }
        require_every_unit("classifier.topics", &self.topics)
    }
}

/// Units sharing a cross-cutting keyword list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualUnitRule {
    pub units: [Unit; 2],
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorSettings {
    /// Override whenever the classifier's best score is below this ...
    pub override_confidence: f32,
    /// ... or the override candidate matched at least this many keywords.
    pub override_min_matches: usize,
    /// Dual-unit re-resolution only fires below this best score.
    pub dual_confidence: f32,
    pub overrides: Vec<UnitKeywords>,
    pub dual_units: Vec<DualUnitRule>,
}

impl Default for CorrectorSettings {
    fn default() -> Self {
        Self {
            override_confidence: 0.4,
            override_min_matches: 2,
            dual_confidence: 0.5,
            overrides: unit_table([
                (Unit::Unit1, strings(&[
                    "osi model", "tcp/ip model", "protocol architecture", "layered architecture",
                    "host", "end system", "edge network", "core network", "presentation layer",
                    "session layer", "application layer",
                ])),
                (Unit::Unit2, strings(&[
                    "ethernet", "csma/cd", "csma/ca", "mac address", "llc", "media access",
                    "fiber optic", "twisted pair", "wireless", "802.11", "token ring",
                    "vlan", "switch", "hub", "collision domain", "crc", "hamming distance",
                    "bit stuffing", "stop-and-wait", "flow control",
                ])),
                (Unit::Unit3, strings(&[
                    "ip address", "ipv4", "ipv6", "routing", "router", "nat", "dhcp",
                    "icmp", "bgp", "ospf", "rip", "cidr", "subnet", "tunneling",
                    "link-state", "distance-vector", "datagram", "virtual circuit",
                ])),
                (Unit::Unit4, strings(&[
                    "tcp", "udp", "http", "ftp", "smtp", "dns", "socket", "port",
                    "three-way handshake", "congestion control", "mime", "email",
                    "web", "file transfer", "name resolution", "stateless", "connection",
                ])),
                (Unit::Unit5, strings(&[
                    "snmp", "mib", "smi", "network management", "monitoring", "sdn",
                    "openflow", "netconf", "yang", "wireshark", "fault management",
                    "northbound api", "southbound api", "controller",
                ])),
            ]),
            dual_units: vec![
                dual(Unit::Unit1, Unit::Unit4, &["transport layer", "network layer", "layer separation", "protocol stack"]),
                dual(Unit::Unit2, Unit::Unit4, &["flow control", "error control", "reliability", "acknowledgment"]),
                dual(Unit::Unit1, Unit::Unit3, &["gateway", "router", "network architecture", "switching"]),
                dual(Unit::Unit3, Unit::Unit4, &["end-to-end", "host-to-host", "addressing"]),
                dual(Unit::Unit1, Unit::Unit5, &["network management", "protocol management", "architecture management"]),
            ],
        }
    }
}

impl CorrectorSettings {
    fn validate(&self) -> Result<()> {
        if self.override_min_matches == 0 {
            return Err(Error::InvalidConfig("corrector.override_min_matches must be at least 1".to_string()));
        }
        if let Some(entry) = self.overrides.iter().find(|e| e.keywords.is_empty()) {
            return Err(Error::InvalidConfig(format!("corrector.overrides for {} must not be empty", entry.unit)));
        }
        for rule in &self.dual_units {
            let [a, b] = rule.units;
            if a == b {
                return Err(Error::InvalidConfig(format!("dual-unit rule pairs {a} with itself")));
            }
            if rule.keywords.is_empty() {
                return Err(Error::InvalidConfig(format!("dual-unit rule {a}/{b} has no keywords")));
            }
        }
        Ok(())
    }
}

fn require_every_unit(name: &str, table: &[UnitKeywords]) -> Result<()> {
    let mut present = BTreeSet::new();
    for entry in table {
        if !present.insert(entry.unit) {
            return Err(Error::InvalidConfig(format!("{name} lists {} twice", entry.unit)));
        }
        if entry.keywords.is_empty() {
            return Err(Error::InvalidConfig(format!("{name} for {} must not be empty", entry.unit)));
        }
    }
    if let Some(missing) = Unit::ALL.iter().find(|u| !present.contains(u)) {
        return Err(Error::InvalidConfig(format!("{name} is missing {missing}")));
    }
    Ok(())
}

fn unit_table<const N: usize>(entries: [(Unit, Vec<String>); N]) -> Vec<UnitKeywords> {
    entries.into_iter().map(|(unit, keywords)| UnitKeywords { unit, keywords }).collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn dual(a: Unit, b: Unit, keywords: &[&str]) -> DualUnitRule {
    DualUnitRule { units: [a, b], keywords: strings(keywords) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
