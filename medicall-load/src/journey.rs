//! The ordered sequence of API calls one iteration makes.
use reqwest::{Method, StatusCode};

/// One MediCare Call endpoint exercised by the journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Home,
    Member,
    Elders,
    HealthInfo,
    UpsertHealthInfo,
    BloodSugarBeforeMeal,
    BloodSugarAfterMeal,
    UpsertCareCallSetting,
    CareCallSetting,
    RegisterElder,
    UpdateElder,
    HealthAnalysis,
    Meals,
    Medication,
    UpdateMember,
    MentalAnalysis,
    ReservePayment,
    Notices,
    Sleep,
    Subscriptions,
    WeeklyStats,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        if self.is_write() {
            Method::POST
        } else {
            Method::GET
        }
    }

    pub fn is_write(&self) -> bool {
        use Endpoint::*;
        matches!(
            self,
            UpsertHealthInfo
                | UpsertCareCallSetting
                | RegisterElder
                | UpdateElder
                | UpdateMember
                | ReservePayment
        )
    }

    /// Route with `{elderId}` / `{newElderId}` placeholders, as used in log lines.
    pub fn path_template(&self) -> &'static str {
        use Endpoint::*;
        match self {
            Home => "/elders/{elderId}/home",
            Member | UpdateMember => "/member",
            Elders | RegisterElder => "/elders",
            HealthInfo => "/elders/health-info",
            UpsertHealthInfo => "/elders/{elderId}/health-info",
            BloodSugarBeforeMeal | BloodSugarAfterMeal => "/elders/{elderId}/blood-sugar/weekly",
            UpsertCareCallSetting | CareCallSetting => "/elders/{elderId}/care-call-setting",
            UpdateElder => "/elders/{newElderId}",
            HealthAnalysis => "/elders/{elderId}/health-analysis",
            Meals => "/elders/{elderId}/meals",
            Medication => "/elders/{elderId}/medication",
            MentalAnalysis => "/elders/{elderId}/mental-analysis",
            ReservePayment => "/payments/reserve",
            Notices => "/notices",
            Sleep => "/elders/{elderId}/sleep",
            Subscriptions => "/elders/subscriptions",
            WeeklyStats => "/elders/{elderId}/weekly-stats",
        }
    }

    /// Concrete path for this call. `None` when the path needs an id that was never issued.
    pub fn path(&self, elder_id: &str, new_elder_id: Option<&str>) -> Option<String> {
        let template = self.path_template();
        if template.contains("{newElderId}") {
            return new_elder_id.map(|id| template.replace("{newElderId}", id));
        }
        Some(template.replace("{elderId}", elder_id))
    }

    pub fn query(&self, today: &str) -> Vec<(&'static str, String)> {
        use Endpoint::*;
        match self {
            BloodSugarBeforeMeal => vec![
                ("counter", "0".to_string()),
                ("type", "BEFORE_MEAL".to_string()),
            ],
            BloodSugarAfterMeal => vec![
                ("counter", "0".to_string()),
                ("type", "AFTER_MEAL".to_string()),
            ],
            HealthAnalysis | Meals | Medication | MentalAnalysis | Sleep => {
                vec![("date", today.to_string())]
            }
            WeeklyStats => vec![("startDate", today.to_string())],
            _ => vec![],
        }
    }

    pub fn expected_status(&self) -> StatusCode {
        match self {
            Endpoint::UpsertHealthInfo => StatusCode::CREATED,
            _ => StatusCode::OK,
        }
    }

    /// Name the outcome is recorded under in the `checks` metric.
    pub fn check_name(&self) -> &'static str {
        use Endpoint::*;
        match self {
            Home => "home status is 200",
            Member => "member info status is 200",
            Elders => "elder list status is 200",
            HealthInfo => "elder health info status is 200",
            UpsertHealthInfo => "elder health info upsert status is 201",
            BloodSugarBeforeMeal => "weekly blood sugar (before meal) status is 200",
            BloodSugarAfterMeal => "weekly blood sugar (after meal) status is 200",
            UpsertCareCallSetting => "care call setting upsert status is 200",
            CareCallSetting => "care call setting status is 200",
            RegisterElder => "elder registration status is 200",
            UpdateElder => "elder update status is 200",
            HealthAnalysis => "daily health analysis status is 200",
            Meals => "daily meals status is 200",
            Medication => "daily medication status is 200",
            UpdateMember => "member update status is 200",
            MentalAnalysis => "daily mental analysis status is 200",
            ReservePayment => "payment reservation status is 200",
            Notices => "notice list status is 200",
            Sleep => "daily sleep status is 200",
            Subscriptions => "elder subscriptions status is 200",
            WeeklyStats => "weekly stats status is 200",
        }
    }
}

/// A numbered position in the journey.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub number: u8,
    pub endpoint: Endpoint,
}

const fn step(number: u8, endpoint: Endpoint) -> Step {
    Step { number, endpoint }
}

/// Every step in order. Write steps keep their position but only run when enabled.
pub const JOURNEY: [Step; 21] = [
    step(1, Endpoint::Home),
    step(2, Endpoint::Member),
    step(3, Endpoint::Elders),
    step(4, Endpoint::HealthInfo),
    step(5, Endpoint::UpsertHealthInfo),
    step(6, Endpoint::BloodSugarBeforeMeal),
    step(7, Endpoint::BloodSugarAfterMeal),
    step(8, Endpoint::UpsertCareCallSetting),
    step(9, Endpoint::CareCallSetting),
    step(10, Endpoint::RegisterElder),
    step(11, Endpoint::UpdateElder),
    step(12, Endpoint::HealthAnalysis),
    step(14, Endpoint::Meals),
    step(15, Endpoint::Medication),
    step(16, Endpoint::UpdateMember),
    step(17, Endpoint::MentalAnalysis),
    step(18, Endpoint::ReservePayment),
    step(19, Endpoint::Notices),
    step(20, Endpoint::Sleep),
    step(21, Endpoint::Subscriptions),
    step(23, Endpoint::WeeklyStats),
];

/// Which steps of [`JOURNEY`] an iteration walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Journey {
    pub include_writes: bool,
}

impl Journey {
    pub fn read_only() -> Self {
        Self {
            include_writes: false,
        }
    }

    pub fn with_writes() -> Self {
        Self {
            include_writes: true,
        }
    }

    pub fn steps(&self) -> impl Iterator<Item = &'static Step> + '_ {
        JOURNEY
            .iter()
            .filter(move |step| self.include_writes || !step.endpoint.is_write())
    }
}
