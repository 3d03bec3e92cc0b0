//! DDL for the tables the prediction core owns.
//!
//! `patient_feature_facts` is the flattened read model the extractor
//! consumes; in a full deployment it is a materialized view over the
//! patient/visit/observation tables, refreshed by the CRUD side.
//! `predictions` is the append-only audit of every scoring call.

pub const TABLE_FEATURE_FACTS: &str = "patient_feature_facts";
pub const TABLE_PREDICTIONS: &str = "predictions";

pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS patient_feature_facts (
    patient_id              UUID PRIMARY KEY,
    birthdate               DATE,
    sex                     TEXT,
    cd4_count               DOUBLE PRECISION,
    viral_load              TEXT,
    art_start_date          DATE,
    last_visit_date         DATE,
    missed_appointments_6m  INTEGER,
    pickup_adherence        DOUBLE PRECISION,
    distance_to_facility_km DOUBLE PRECISION,
    has_phone               BOOLEAN,
    has_support_system      BOOLEAN,
    regimen                 TEXT,
    prior_interruptions     INTEGER,
    updated_at              TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS predictions (
    id             UUID PRIMARY KEY,
    patient_id     UUID NOT NULL,
    model_version  TEXT NOT NULL,
    probability    DOUBLE PRECISION NOT NULL,
    raw_margin     DOUBLE PRECISION NOT NULL,
    risk_level     TEXT NOT NULL,
    confidence     DOUBLE PRECISION NOT NULL,
    features       JSONB NOT NULL,
    explanation    JSONB NOT NULL,
    created_at     TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_predictions_patient
    ON predictions (patient_id, created_at DESC);
"#;
