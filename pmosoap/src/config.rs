//! Configuration d'un client SOAP
//!
//! Un [`ClientConfig`] se construit soit directement dans le code, soit à
//! partir d'un document YAML :
//!
//! ```yaml
//! endpoint: http://ccmm.example.com/ccmmwebservices/CIUtilityWs.asmx
//! tls: false
//! auth:
//!   login: agent
//!   password: secret
//! verbose: true
//! ```
//!
//! Les variables d'environnement préfixées par `PMOSOAP__` surchargent le
//! document (`PMOSOAP__ENDPOINT`, `PMOSOAP__AUTH__LOGIN`, `PMOSOAP__VERBOSE`…).

use crate::envelope::{SoapHeader, SoapPayload};
use crate::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::{env, fs, path::Path};
use tracing::info;
use url::Url;

const ENV_PREFIX: &str = "PMOSOAP__";

/// Identifiants HTTP Basic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub login: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Configuration immuable d'un client SOAP pour un endpoint
#[derive(Debug, Clone)]
pub struct ClientConfig {
    endpoint: Url,
    tls: bool,
    auth: Option<BasicAuth>,
    header: Option<SoapHeader>,
    verbose: bool,
}

impl ClientConfig {
    /// Crée une configuration pour l'endpoint donné
    ///
    /// Le drapeau TLS est déduit du schéma de l'URL ; il reste informatif,
    /// c'est l'URL qui décide du transport effectif.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let tls = endpoint.scheme() == "https";
        Ok(Self {
            endpoint,
            tls,
            auth: None,
            header: None,
            verbose: false,
        })
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_auth(mut self, auth: Option<BasicAuth>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_basic_auth(self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_auth(Some(BasicAuth::new(login, password)))
    }

    /// Attache un en-tête SOAP à tous les appels
    pub fn with_header<H>(mut self, header: H) -> Self
    where
        H: SoapPayload + Serialize + Send + Sync + 'static,
    {
        self.header = Some(SoapHeader::new(header));
        self
    }

    pub fn with_soap_header(mut self, header: Option<SoapHeader>) -> Self {
        self.header = header;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Même configuration, autre endpoint
    pub fn for_endpoint(&self, endpoint: &str) -> Result<Self> {
        let mut config = self.clone();
        config.endpoint = Url::parse(endpoint)?;
        Ok(config)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn tls(&self) -> bool {
        self.tls
    }

    pub fn auth(&self) -> Option<&BasicAuth> {
        self.auth.as_ref()
    }

    pub fn header(&self) -> Option<&SoapHeader> {
        self.header.as_ref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Charge la configuration depuis un fichier YAML, surchargé par l'environnement
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        ClientSettings::load(path)?.into_config()
    }

    /// Charge la configuration depuis un document YAML, surchargé par l'environnement
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        ClientSettings::from_yaml_str(yaml)?.into_config()
    }
}

/// Forme sérialisable de la configuration (fichier YAML)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub endpoint: String,
    pub tls: Option<bool>,
    pub auth: Option<BasicAuth>,
    pub verbose: bool,
}

impl ClientSettings {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read SOAP client config {}", path.display()))?;
        info!(config_file=%path.display(), "Loaded SOAP client config");
        Self::from_yaml_str(&yaml)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Self::from_yaml_with_overrides(yaml, env::vars())
    }

    fn from_yaml_with_overrides<I>(yaml: &str, vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let value: Value = serde_yaml::from_str(yaml).context("Invalid SOAP client config")?;
        let mut value = match value {
            Value::Null => Value::Mapping(Mapping::new()),
            other => lower_keys_value(other),
        };
        apply_overrides(&mut value, vars);
        serde_yaml::from_value(value).context("Invalid SOAP client config")
    }

    pub fn into_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.endpoint)
            .with_context(|| format!("Invalid SOAP endpoint '{}'", self.endpoint))?
            .with_auth(self.auth)
            .verbose(self.verbose);
        if let Some(tls) = self.tls {
            config = config.with_tls(tls);
        }
        Ok(config)
    }
}

fn apply_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        if let Some(path) = key.strip_prefix(ENV_PREFIX) {
            let path = path
                .split("__")
                .map(str::to_lowercase)
                .collect::<Vec<_>>();
            set_value(config, &path, convert_env_value(&value));
        }
    }
}

fn set_value(config: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = config;
    for key in parents {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        current = match current {
            Value::Mapping(map) => map
                .entry(Value::String(key.clone()))
                .or_insert_with(|| Value::Mapping(Mapping::new())),
            _ => return,
        };
    }

    if !current.is_mapping() {
        *current = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = current {
        map.insert(Value::String(last.clone()), value);
    }
}

fn convert_env_value(value: &str) -> Value {
    // Seuls les drapeaux sont typés : un mot de passe numérique reste une chaîne
    match serde_yaml::from_str::<Value>(value) {
        Ok(parsed @ Value::Bool(_)) => parsed,
        _ => Value::String(value.to_string()),
    }
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}
