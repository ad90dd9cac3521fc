//! Step registry: the static, ordered step sequence of each role's wizard.
//!
//! Each role has exactly one canonical sequence. Step ids are dense and
//! 1-based; slice order is the authoritative step order.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::Role;

use super::validation::{FieldRule, RuleKind};

/// Route segment of the summary page, shared by both wizards.
pub const SUMMARY_SEGMENT: &str = "ringkasan";

/// Route of the sign-in page used for unauthenticated redirects.
pub const SIGN_IN_ROUTE: &str = "/auth/signin";

/// Route users are sent to when their role does not match the wizard.
pub const HOME_ROUTE: &str = "/";

/// One page of a wizard and the profile fields it owns.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub id: u8,
    pub route_segment: &'static str,
    pub title: &'static str,
    pub required: bool,
    pub data_keys: &'static [&'static str],
    #[serde(skip)]
    pub rules: &'static [FieldRule],
}

impl StepDefinition {
    /// Whether `key` is one of the fields this step owns.
    pub fn owns(&self, key: &str) -> bool {
        self.data_keys.contains(&key)
    }
}

/// The ordered step sequence of one role's wizard.
#[derive(Debug)]
pub struct StepRegistry {
    role: Role,
    steps: &'static [StepDefinition],
    dashboard_route: &'static str,
}

impl StepRegistry {
    /// The registry for a role's wizard.
    pub fn for_role(role: Role) -> &'static StepRegistry {
        match role {
            Role::JobSeeker => &JOB_SEEKER_WIZARD,
            Role::Employer => &EMPLOYER_WIZARD,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// All steps in declared order.
    pub fn steps(&self) -> &'static [StepDefinition] {
        self.steps
    }

    /// Number of steps (the summary page is not a step).
    pub fn len(&self) -> u8 {
        self.steps.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step by its 1-based id.
    pub fn step(&self, id: u8) -> Result<&'static StepDefinition, CoreError> {
        id.checked_sub(1)
            .and_then(|idx| self.steps.get(idx as usize))
            .ok_or_else(|| CoreError::UnknownStep(id.to_string()))
    }

    /// Look up a step by its route segment.
    pub fn step_for_route(&self, segment: &str) -> Result<&'static StepDefinition, CoreError> {
        self.steps
            .iter()
            .find(|s| s.route_segment == segment)
            .ok_or_else(|| CoreError::UnknownStep(segment.to_string()))
    }

    /// Required steps in declared order.
    pub fn required_steps(&self) -> impl Iterator<Item = &'static StepDefinition> {
        self.steps.iter().filter(|s| s.required)
    }

    /// The step after `id`, or `None` when `id` is the last step.
    pub fn next(&self, id: u8) -> Option<&'static StepDefinition> {
        self.steps.get(id as usize)
    }

    /// The step before `id`, or `None` when `id` is the first step.
    pub fn previous(&self, id: u8) -> Option<&'static StepDefinition> {
        id.checked_sub(2).and_then(|idx| self.steps.get(idx as usize))
    }

    /// Base path of this wizard, e.g. `/job-seeker/onboarding`.
    pub fn base_route(&self) -> String {
        format!("/{}/onboarding", self.role.path_segment())
    }

    /// Full page route of a step.
    pub fn step_route(&self, step: &StepDefinition) -> String {
        format!("{}/{}", self.base_route(), step.route_segment)
    }

    /// Full page route of the summary page.
    pub fn summary_route(&self) -> String {
        format!("{}/{SUMMARY_SEGMENT}", self.base_route())
    }

    /// Where a user lands once onboarding is complete.
    pub fn dashboard_route(&self) -> &'static str {
        self.dashboard_route
    }
}

// ---------------------------------------------------------------------------
// Job seeker wizard
// ---------------------------------------------------------------------------

const GENDERS: &[&str] = &["male", "female"];

const EXPERIENCE_LEVELS: &[&str] = &["fresh_graduate", "junior", "mid", "senior", "lead"];

static JOB_SEEKER_WIZARD: StepRegistry = StepRegistry {
    role: Role::JobSeeker,
    dashboard_route: "/job-seeker/dashboard",
    steps: &[
        StepDefinition {
            id: 1,
            route_segment: "informasi-dasar",
            title: "Basic Information",
            required: true,
            data_keys: &["firstName", "lastName", "phoneNumber", "dateOfBirth", "gender", "about"],
            rules: &[
                FieldRule::new("firstName", RuleKind::RequiredString),
                FieldRule::new("lastName", RuleKind::OptionalMaxLength(100)),
                FieldRule::new("phoneNumber", RuleKind::Phone),
                FieldRule::new("dateOfBirth", RuleKind::DateInPast),
                FieldRule::new("gender", RuleKind::OneOf(GENDERS)),
                FieldRule::new("about", RuleKind::OptionalMaxLength(1000)),
            ],
        },
        StepDefinition {
            id: 2,
            route_segment: "alamat",
            title: "Address",
            required: true,
            data_keys: &["province", "city", "district", "postalCode", "addressDetail"],
            rules: &[
                FieldRule::new("province", RuleKind::RequiredString),
                FieldRule::new("city", RuleKind::RequiredString),
                FieldRule::new("district", RuleKind::RequiredString),
                FieldRule::new("postalCode", RuleKind::OptionalPostalCode),
                FieldRule::new("addressDetail", RuleKind::RequiredString),
            ],
        },
        StepDefinition {
            id: 3,
            route_segment: "pendidikan",
            title: "Education",
            required: true,
            data_keys: &["educations"],
            rules: &[
                FieldRule::new("educations", RuleKind::ArrayMinLength(1)),
                FieldRule::new(
                    "educations",
                    RuleKind::ArrayItemsRequire(&["institution", "degree", "major"]),
                ),
            ],
        },
        StepDefinition {
            id: 4,
            route_segment: "level-pengalaman",
            title: "Experience Level",
            required: true,
            data_keys: &["experienceLevel"],
            rules: &[FieldRule::new("experienceLevel", RuleKind::OneOf(EXPERIENCE_LEVELS))],
        },
        StepDefinition {
            id: 5,
            route_segment: "pengalaman-kerja",
            title: "Work Experience",
            required: false,
            data_keys: &["workExperiences"],
            rules: &[FieldRule::new(
                "workExperiences",
                RuleKind::ArrayItemsRequire(&["company", "position", "startDate"]),
            )],
        },
        StepDefinition {
            id: 6,
            route_segment: "keahlian",
            title: "Skills",
            required: true,
            data_keys: &["skills", "languages"],
            rules: &[FieldRule::new("skills", RuleKind::ArrayMinLength(1))],
        },
        StepDefinition {
            id: 7,
            route_segment: "unggah-dokumen",
            title: "Documents",
            required: false,
            data_keys: &["cvUrl", "photoUrl", "portfolioUrl"],
            rules: &[
                FieldRule::new("cvUrl", RuleKind::OptionalUrl),
                FieldRule::new("photoUrl", RuleKind::OptionalUrl),
                FieldRule::new("portfolioUrl", RuleKind::OptionalUrl),
            ],
        },
    ],
};

// ---------------------------------------------------------------------------
// Employer wizard
// ---------------------------------------------------------------------------

const COMPANY_SIZES: &[&str] = &["1-10", "11-50", "51-200", "201-500", "501-1000", "1000+"];

static EMPLOYER_WIZARD: StepRegistry = StepRegistry {
    role: Role::Employer,
    dashboard_route: "/employer/dashboard",
    steps: &[
        StepDefinition {
            id: 1,
            route_segment: "informasi-perusahaan",
            title: "Company Information",
            required: true,
            data_keys: &["companyName", "industry", "companySize", "website", "description"],
            rules: &[
                FieldRule::new("companyName", RuleKind::RequiredString),
                FieldRule::new("industry", RuleKind::RequiredString),
                FieldRule::new("companySize", RuleKind::OneOf(COMPANY_SIZES)),
                FieldRule::new("website", RuleKind::OptionalUrl),
                FieldRule::new("description", RuleKind::OptionalMaxLength(2000)),
            ],
        },
        StepDefinition {
            id: 2,
            route_segment: "alamat-perusahaan",
            title: "Company Address",
            required: true,
            data_keys: &["province", "city", "addressDetail", "postalCode"],
            rules: &[
                FieldRule::new("province", RuleKind::RequiredString),
                FieldRule::new("city", RuleKind::RequiredString),
                FieldRule::new("addressDetail", RuleKind::RequiredString),
                FieldRule::new("postalCode", RuleKind::OptionalPostalCode),
            ],
        },
        StepDefinition {
            id: 3,
            route_segment: "media-sosial",
            title: "Social Media",
            required: false,
            data_keys: &["linkedinUrl", "instagramUrl", "facebookUrl", "twitterUrl"],
            rules: &[
                FieldRule::new("linkedinUrl", RuleKind::OptionalUrl),
                FieldRule::new("instagramUrl", RuleKind::OptionalUrl),
                FieldRule::new("facebookUrl", RuleKind::OptionalUrl),
                FieldRule::new("twitterUrl", RuleKind::OptionalUrl),
            ],
        },
        StepDefinition {
            id: 4,
            route_segment: "penanggung-jawab",
            title: "Person in Charge",
            required: true,
            data_keys: &["picName", "picPosition", "picPhone", "picEmail"],
            rules: &[
                FieldRule::new("picName", RuleKind::RequiredString),
                FieldRule::new("picPosition", RuleKind::RequiredString),
                FieldRule::new("picPhone", RuleKind::Phone),
                FieldRule::new("picEmail", RuleKind::Email),
            ],
        },
        StepDefinition {
            id: 5,
            route_segment: "logo-perusahaan",
            title: "Company Logo",
            required: false,
            data_keys: &["logoUrl"],
            rules: &[FieldRule::new("logoUrl", RuleKind::OptionalUrl)],
        },
    ],
};
