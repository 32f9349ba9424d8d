//! Workbook sheet list and workbook relationships.

use crate::container::Package;
use crate::error::{Error, Result};
use quick_xml::events::Event;
use std::collections::HashMap;

/// Sheet entry from workbook.xml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    /// Display name
    pub name: String,
    /// `sheetId` attribute
    pub sheet_id: String,
    /// Relationship id pointing at the worksheet part
    pub rel_id: String,
}

/// Ordered sheet entries of a workbook.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<SheetEntry>,
}

impl Workbook {
    /// Load `workbook.xml`. The part is required.
    pub fn load(package: &Package) -> Result<Self> {
        let xml = package.read_xml("workbook.xml")?;
        Self::parse(&xml)
    }

    /// Parse workbook.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut sheets = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                    let mut entry = SheetEntry {
                        name: String::new(),
                        sheet_id: String::new(),
                        rel_id: String::new(),
                    };

                    for attr in e.attributes() {
                        let attr = attr?;
                        let value = attr.unescape_value()?.into_owned();
                        match attr.key.local_name().as_ref() {
                            b"name" => entry.name = value,
                            b"sheetId" => entry.sheet_id = value,
                            // `r:id`, whatever the prefix is bound to
                            b"id" if attr.key.prefix().is_some() => entry.rel_id = value,
                            _ => {}
                        }
                    }

                    if !entry.name.is_empty() {
                        sheets.push(entry);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Relationship id to target path, from `workbook.xml.rels`.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMap {
    targets: HashMap<String, String>,
}

impl RelationshipMap {
    /// Load `workbook.xml.rels`; an absent part gives an empty map.
    pub fn load(package: &Package) -> Result<Self> {
        match package.read_optional_xml("workbook.xml.rels")? {
            Some(xml) => Self::parse(&xml),
            None => Ok(Self::default()),
        }
    }

    /// Parse relationships XML. Later duplicates of an id replace earlier ones.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut targets = HashMap::new();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut id = String::new();
                    let mut target = String::new();

                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Id" => id = attr.unescape_value()?.into_owned(),
                            b"Target" => target = attr.unescape_value()?.into_owned(),
                            _ => {}
                        }
                    }

                    if !id.is_empty() && !target.is_empty() {
                        targets.insert(id, target);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { targets })
    }

    /// Target path for a relationship id.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.targets.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
