//! JSON bodies for the write steps.
use crate::journey::Endpoint;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElderHealthInfo {
    pub disease_list: Vec<String>,
    pub medication_cycle: String,
    pub special_note: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CareCallSetting {
    pub first_call_time: String,
    pub second_call_time: String,
    pub third_call_time: String,
    pub call_recurrence_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElderProfile {
    pub name: String,
    pub birth_date: String,
    pub gender: String,
    pub phone: String,
    pub relationship: String,
    pub residence_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub name: String,
    pub gender: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub category_type: String,
    pub category_id: String,
    pub uid: String,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReservation {
    pub product_name: String,
    pub product_count: u32,
    pub total_pay_amount: u64,
    pub tax_scope_amount: u64,
    pub tax_ex_scope_amount: u64,
    pub return_url: String,
    pub product_items: Vec<ProductItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Payload {
    HealthInfo(ElderHealthInfo),
    CareCallSetting(CareCallSetting),
    Elder(ElderProfile),
    Member(MemberUpdate),
    Payment(PaymentReservation),
}

const PLAN_NAME: &str = "메디케어콜 스탠다드 플랜";

impl Payload {
    /// Body sent by `endpoint`, personalised for the given VU. `None` for reads.
    pub fn for_endpoint(endpoint: Endpoint, vu: usize) -> Option<Self> {
        let payload = match endpoint {
            Endpoint::UpsertHealthInfo => Self::HealthInfo(ElderHealthInfo {
                disease_list: vec!["고혈압".to_string(), "당뇨".to_string()],
                medication_cycle: "매일 아침".to_string(),
                special_note: "특별한 이상 없음".to_string(),
            }),
            Endpoint::UpsertCareCallSetting => Self::CareCallSetting(CareCallSetting {
                first_call_time: "09:00".to_string(),
                second_call_time: "13:00".to_string(),
                third_call_time: "18:00".to_string(),
                call_recurrence_type: "DAILY".to_string(),
            }),
            Endpoint::RegisterElder => Self::Elder(ElderProfile {
                name: format!("테스트어르신{vu}"),
                birth_date: "1950-01-01".to_string(),
                gender: "MALE".to_string(),
                phone: random_phone(),
                relationship: "SON".to_string(),
                residence_type: "ALONE".to_string(),
            }),
            Endpoint::UpdateElder => Self::Elder(ElderProfile {
                name: format!("수정된테스트어르신{vu}"),
                birth_date: "1950-01-01".to_string(),
                gender: "FEMALE".to_string(),
                phone: random_phone(),
                relationship: "DAUGHTER".to_string(),
                residence_type: "WITH_FAMILY".to_string(),
            }),
            Endpoint::UpdateMember => Self::Member(MemberUpdate {
                name: format!("수정된회원{vu}"),
                gender: "FEMALE".to_string(),
                birth_date: "1990-05-15".to_string(),
            }),
            Endpoint::ReservePayment => Self::Payment(PaymentReservation {
                product_name: PLAN_NAME.to_string(),
                product_count: 1,
                total_pay_amount: 19_000,
                tax_scope_amount: 19_000,
                tax_ex_scope_amount: 0,
                return_url: "https://example.com/payment/complete".to_string(),
                product_items: vec![ProductItem {
                    category_type: "ETC".to_string(),
                    category_id: "ETC".to_string(),
                    uid: "PRODUCT_123".to_string(),
                    name: PLAN_NAME.to_string(),
                    count: 1,
                }],
            }),
            _ => return None,
        };
        Some(payload)
    }
}

/// `010` followed by eight random digits.
fn random_phone() -> String {
    let digits: u32 = rand::thread_rng().gen_range(10_000_000..100_000_000);
    format!("010{digits}")
}

/// Response of the elder registration call.
#[derive(Debug, Deserialize)]
pub struct RegisteredElder {
    pub id: Option<serde_json::Value>,
}

impl RegisteredElder {
    /// The issued id as a path segment; accepts numeric and string ids.
    pub fn id_segment(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}
