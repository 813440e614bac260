//! Catalog of developer fields, built from `developer_data_id` and
//! `field_description` messages as they stream past.

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use log::debug;

use super::data::{BaseType, DecodedMessage, Value};

/// Global message number of `field_description` messages.
pub const FIELD_DESCRIPTION: u16 = 206;
/// Global message number of `developer_data_id` messages.
pub const DEVELOPER_DATA_ID: u16 = 207;

/// A developer field, as described by a `field_description` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperFieldDescription {
    pub developer_index: u8,
    pub number: u8,
    pub base_type: BaseType,
    pub name: Option<String>,
    pub units: Option<String>,
    pub scale: Option<u8>,
    pub offset: Option<i8>,
    /// The native message and field this developer field stands in for.
    pub native_message: Option<u16>,
    pub native_field: Option<u8>,
}

/// A developer application, as identified by a `developer_data_id`
/// message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeveloperDataId {
    pub developer_index: u8,
    pub developer_id: Option<Vec<u8>>,
    pub application_id: Option<Vec<u8>>,
    pub manufacturer_id: Option<u16>,
    pub application_version: Option<u32>,
}

/// Developer field descriptions and applications seen so far in a document.
#[derive(Debug, Clone, Default)]
pub struct DeveloperCatalog {
    fields: BTreeMap<(u8, u8), DeveloperFieldDescription>,
    developers: BTreeMap<u8, DeveloperDataId>,
}

impl DeveloperCatalog {
    /// The description of a developer field, if one has been seen.
    pub fn field(&self, developer_index: u8, number: u8) -> Option<&DeveloperFieldDescription> {
        self.fields.get(&(developer_index, number))
    }

    /// The application registered under a developer data index.
    pub fn developer(&self, developer_index: u8) -> Option<&DeveloperDataId> {
        self.developers.get(&developer_index)
    }

    /// Every catalogued field description, by developer index and number.
    pub fn fields(&self) -> impl Iterator<Item = &DeveloperFieldDescription> {
        self.fields.values()
    }

    /// Whether no developer data has been seen.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.developers.is_empty()
    }

    /// Record a decoded message if it describes developer data.
    ///
    /// Returns the new field description, when the message was a complete
    /// `field_description`. Incomplete descriptions are skipped, leaving
    /// later uses of the field unresolved.
    pub fn observe(&mut self, message: &DecodedMessage) -> Option<&DeveloperFieldDescription> {
        match message.global_message {
            FIELD_DESCRIPTION => self.observe_field_description(message),
            DEVELOPER_DATA_ID => {
                self.observe_developer_data_id(message);
                None
            }
            _ => None,
        }
    }

    fn observe_field_description(
        &mut self,
        message: &DecodedMessage,
    ) -> Option<&DeveloperFieldDescription> {
        let byte = |n| message.value(n).and_then(Value::as_u64).map(|x| x as u8);
        let string = |n| message.value(n).and_then(Value::as_str).map(String::from);

        let (Some(developer_index), Some(number), Some(kind)) = (byte(0), byte(1), byte(2)) else {
            debug!("Skipping incomplete field description.");
            return None;
        };

        let Ok(base_type) = BaseType::try_from(kind) else {
            debug!("Skipping field description with base type 0x{kind:02X}.");
            return None;
        };

        let description = DeveloperFieldDescription {
            developer_index,
            number,
            base_type,
            name: string(3),
            units: string(8),
            scale: byte(6),
            offset: message.value(7).and_then(Value::as_i64).map(|x| x as i8),
            native_message: message
                .value(14)
                .and_then(Value::as_u64)
                .map(|x| x as u16),
            native_field: byte(15),
        };

        debug!(
            "Developer field {developer_index}:{number} described as {base_type} ({:?}).",
            description.name
        );

        self.fields.insert((developer_index, number), description);
        self.fields.get(&(developer_index, number))
    }

    fn observe_developer_data_id(&mut self, message: &DecodedMessage) {
        let bytes = |n| match message.value(n) {
            Some(Value::Bytes(b)) => Some(b.clone()),
            Some(Value::Array(a)) => a
                .iter()
                .map(|x| x.as_ref()?.as_u64().map(|x| x as u8))
                .collect(),
            Some(x) => x.as_u64().map(|x| Vec::from([x as u8])),
            None => None,
        };

        let Some(developer_index) = message.value(3).and_then(Value::as_u64) else {
            debug!("Skipping developer data id without an index.");
            return;
        };
        let developer_index = developer_index as u8;

        let developer = DeveloperDataId {
            developer_index,
            developer_id: bytes(0),
            application_id: bytes(1),
            manufacturer_id: message.value(2).and_then(Value::as_u64).map(|x| x as u16),
            application_version: message.value(4).and_then(Value::as_u64).map(|x| x as u32),
        };

        debug!("Developer data index {developer_index} registered.");
        self.developers.insert(developer_index, developer);
    }
}
