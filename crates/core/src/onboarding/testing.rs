//! Valid per-step form fixtures shared by the unit tests.

use serde_json::{json, Map, Value};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

use super::profile::ProfileRecord;
use super::sync::PersistenceSynchronizer;
use super::write_gate::WriteGate;

fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("object literal")
}

/// One valid field set per job seeker step, indexed by `id - 1`.
pub(crate) fn job_seeker_steps() -> Vec<Map<String, Value>> {
    vec![
        obj(json!({
            "firstName": "Siti",
            "lastName": "Rahma",
            "phoneNumber": "081234567890",
            "dateOfBirth": "1998-04-12",
            "gender": "female"
        })),
        obj(json!({
            "province": "Jawa Barat",
            "city": "Bandung",
            "district": "Coblong",
            "postalCode": "40132",
            "addressDetail": "Jl. Ir. H. Juanda No. 10"
        })),
        obj(json!({
            "educations": [
                { "institution": "Institut Teknologi Bandung", "degree": "S1", "major": "Informatika", "startYear": 2016 }
            ]
        })),
        obj(json!({ "experienceLevel": "junior" })),
        obj(json!({
            "workExperiences": [
                { "company": "PT Nusantara", "position": "Backend Engineer", "startDate": "2021-02-01" }
            ]
        })),
        obj(json!({ "skills": ["Rust", "PostgreSQL"], "languages": ["id", "en"] })),
        obj(json!({ "cvUrl": "https://files.temu.id/cv/siti.pdf" })),
    ]
}

/// One valid field set per employer step, indexed by `id - 1`.
pub(crate) fn employer_steps() -> Vec<Map<String, Value>> {
    vec![
        obj(json!({
            "companyName": "PT Maju Bersama",
            "industry": "Retail",
            "companySize": "51-200",
            "website": "https://majubersama.co.id"
        })),
        obj(json!({
            "province": "DKI Jakarta",
            "city": "Jakarta Selatan",
            "addressDetail": "Jl. Sudirman Kav. 5",
            "postalCode": "12190"
        })),
        obj(json!({ "linkedinUrl": "https://www.linkedin.com/company/maju-bersama" })),
        obj(json!({
            "picName": "Budi Santoso",
            "picPosition": "HR Manager",
            "picPhone": "+6281298765432",
            "picEmail": "budi@majubersama.co.id"
        })),
        obj(json!({ "logoUrl": "https://files.temu.id/logo/maju.png" })),
    ]
}

/// Save a step through a permit from a gate of its own.
pub(crate) async fn save(
    sync: &PersistenceSynchronizer,
    user_id: DbId,
    role: Role,
    step_id: u8,
    data: Map<String, Value>,
) -> Result<ProfileRecord, CoreError> {
    let permit = WriteGate::new()
        .try_acquire(user_id, role)
        .expect("a new gate has a free permit");
    sync.save_step(permit, step_id, data).await
}
