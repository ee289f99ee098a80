//! Static translation table for the PDF export and enumerated values.
//!
//! English is the source language; a phrase missing from a target table is
//! rendered as-is.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }
}

pub mod labels {
    pub const TITLE: &str = "New Part Application";
    pub const IDENTIFICATION: &str = "Identification";
    pub const APPLICATION_ID: &str = "Application ID";
    pub const CREATED_AT: &str = "Created";
    pub const STATUS: &str = "Status";
    pub const PART_INFORMATION: &str = "Part Information";
    pub const PART_NAME: &str = "Part Name";
    pub const PART_DESCRIPTION: &str = "Part Description";
    pub const VEHICLE_MODEL: &str = "Vehicle Model";
    pub const QUANTITY: &str = "Quantity";
    pub const ESTIMATED_COST: &str = "Estimated Cost";
    pub const REQUEST_INFORMATION: &str = "Request Information";
    pub const REQUESTER: &str = "Requester";
    pub const DEPARTMENT: &str = "Department";
    pub const URGENCY: &str = "Urgency";
    pub const TECHNICAL_SPECS: &str = "Technical Specification";
    pub const JUSTIFICATION: &str = "Justification";
    pub const NOTES: &str = "Notes";
    pub const IMAGE: &str = "Image";
}

static ZH: &[(&str, &str)] = &[
    (labels::TITLE, "新零件申请"),
    (labels::IDENTIFICATION, "申请标识"),
    (labels::APPLICATION_ID, "申请编号"),
    (labels::CREATED_AT, "创建时间"),
    (labels::STATUS, "状态"),
    (labels::PART_INFORMATION, "零件信息"),
    (labels::PART_NAME, "零件名称"),
    (labels::PART_DESCRIPTION, "零件描述"),
    (labels::VEHICLE_MODEL, "车型"),
    (labels::QUANTITY, "数量"),
    (labels::ESTIMATED_COST, "预估成本"),
    (labels::REQUEST_INFORMATION, "申请信息"),
    (labels::REQUESTER, "申请人"),
    (labels::DEPARTMENT, "部门"),
    (labels::URGENCY, "紧急程度"),
    (labels::TECHNICAL_SPECS, "技术规格"),
    (labels::JUSTIFICATION, "申请理由"),
    (labels::NOTES, "备注"),
    (labels::IMAGE, "图片"),
    ("low", "低"),
    ("medium", "中"),
    ("high", "高"),
    ("pending", "待审批"),
    ("approved", "已批准"),
    ("rejected", "已拒绝"),
];

#[derive(Debug, Clone)]
pub struct Localizer {
    tables: HashMap<Language, HashMap<&'static str, &'static str>>,
}

static DEFAULT: Lazy<Localizer> = Lazy::new(Localizer::new);

impl Localizer {
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        tables.insert(Language::Zh, ZH.iter().copied().collect());
        Self { tables }
    }

    pub fn global() -> &'static Localizer {
        &DEFAULT
    }

    pub fn translate<'a>(&'a self, text: &'a str, lang: Language) -> &'a str {
        self.tables
            .get(&lang)
            .and_then(|table| table.get(text).copied())
            .unwrap_or(text)
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new()
    }
}
