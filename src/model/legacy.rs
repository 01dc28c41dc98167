//! Migration of the older connector layouts into [`ConnectorRecord`] arrays.
//!
//! Two historical shapes exist besides the canonical array under `connector`:
//! a single record object stored under `connector`, and bare `connectTo` /
//! `connectorType` fields on the item itself. Both are folded into the array
//! when the data is loaded, so nothing past the model sees them.

use serde::Deserialize;
use uuid::Uuid;

use crate::engine::connector::ConnectorType;
use crate::model::item::ConnectorRecord;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConnectorField {
    Many(Vec<ConnectorRecord>),
    One(ConnectorRecord),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyConnectorFields {
    #[serde(default)]
    connector: Option<ConnectorField>,
    #[serde(default)]
    connect_to: Option<Uuid>,
    #[serde(default)]
    connector_type: Option<ConnectorType>,
}

impl LegacyConnectorFields {
    /// Canonical connector list; legacy entries keep their original order
    /// and exact duplicates are dropped.
    pub(crate) fn migrate(self) -> Vec<ConnectorRecord> {
        let mut records = match self.connector {
            Some(ConnectorField::Many(records)) => records,
            Some(ConnectorField::One(record)) => {
                log::debug!("migrating single connector object to {}", record.to);
                vec![record]
            }
            None => Vec::new(),
        };

        if let Some(to) = self.connect_to {
            let record = ConnectorRecord::new(to, self.connector_type.unwrap_or_default());
            if !records.contains(&record) {
                log::debug!("migrating item-level connectTo {to}");
                records.push(record);
            }
        }
        records
    }
}
