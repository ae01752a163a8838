use async_trait::async_trait;
use furnace_common::{VarAddress, VarKind, VarSlot, VarTable, VariableStoreConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    clients::VariableStore,
    error::{BridgeError, BridgeResult},
};

#[derive(Debug, Deserialize)]
struct VarListXml {
    #[serde(rename = "var", default)]
    vars: Vec<VarXml>,
}

#[derive(Debug, Deserialize)]
struct VarXml {
    #[serde(rename = "@type")]
    kind: u8,
    #[serde(rename = "@id")]
    id: u16,
    val: i64,
}

/// Controller REST interface: `/rest/vars/get/...` and `/rest/vars/set/...` with basic auth.
pub struct RestVariableStore {
    client: Client,
    base_url: String,
    user: String,
    pass: String,
}

impl RestVariableStore {
    pub fn new(client: Client, config: &VariableStoreConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            user: config.user.clone(),
            pass: config.pass.clone(),
        }
    }

    async fn get_text(&self, path: &str) -> Result<String, reqwest::Error> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.get(url);
        if !self.user.is_empty() {
            request = request.basic_auth(&self.user, Some(&self.pass));
        }
        request.send().await?.error_for_status()?.text().await
    }
}

#[async_trait]
impl VariableStore for RestVariableStore {
    async fn read_all(&self) -> BridgeResult<VarTable> {
        let path = format!("/rest/vars/get/{}", VarKind::Integer.code());
        let body = self
            .get_text(&path)
            .await
            .map_err(|err| BridgeError::fetch("controller listing", err))?;
        let table = parse_var_list(&body)?;
        debug!("controller listing returned {} integer variables", table.len());
        Ok(table)
    }

    async fn read_var(&self, address: VarAddress) -> BridgeResult<i64> {
        let path = format!("/rest/vars/get/{}/{}", address.kind.code(), address.id);
        let body = self
            .get_text(&path)
            .await
            .map_err(|err| BridgeError::fetch(&path, err))?;
        parse_var(&body)
    }

    async fn write_var(&self, address: VarAddress, value: i64) -> BridgeResult<()> {
        let path = format!(
            "/rest/vars/set/{}/{}/{value}",
            address.kind.code(),
            address.id
        );
        self.get_text(&path)
            .await
            .map(|_| ())
            .map_err(|err| BridgeError::write(&path, err))
    }
}

/// Integer variable ids are one-based; slot `n` is id `n + 1`. Other kinds are ignored.
pub(crate) fn parse_var_list(body: &str) -> BridgeResult<VarTable> {
    let list: VarListXml = quick_xml::de::from_str(body)
        .map_err(|err| BridgeError::fetch("controller listing xml", err))?;

    Ok(list
        .vars
        .into_iter()
        .filter(|var| var.kind == VarKind::Integer.code() && var.id > 0)
        .map(|var| (VarSlot(var.id - 1), var.val))
        .collect())
}

pub(crate) fn parse_var(body: &str) -> BridgeResult<i64> {
    let var: VarXml = quick_xml::de::from_str(body)
        .map_err(|err| BridgeError::fetch("controller variable xml", err))?;
    Ok(var.val)
}
