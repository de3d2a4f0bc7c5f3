use super::error::ScoreError;
use super::record::{Field, GraftRecord, RawRecord};

/// Validate a raw row and convert it into a typed `GraftRecord`.
///
/// Checks run in order: label, field presence (all missing fields reported
/// together), numeric parsing, then domain constraints against `as_of_year`.
pub fn validate_record(raw: &RawRecord, as_of_year: i32) -> Result<GraftRecord, ScoreError> {
    let graft_type = raw.graft_type.trim();
    if graft_type.is_empty() {
        return Err(ScoreError::EmptyGraftType);
    }

    let missing: Vec<Field> = Field::ALL
        .iter()
        .copied()
        .filter(|f| raw.get(f.column()).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ScoreError::MissingField {
            graft_type: graft_type.to_string(),
            fields: missing,
        });
    }

    let introduced = parse_year(raw, graft_type)?;
    let number = |field: Field| parse_number(raw, graft_type, field);

    let record = GraftRecord {
        graft_type: graft_type.to_string(),
        introduced,
        pro: number(Field::Pro)?,
        lysholm_score: number(Field::LysholmScore)?,
        lsi: number(Field::Lsi)?,
        rts: number(Field::Rts)?,
        long_term_success: number(Field::LongTermSuccess)?,
        complications: number(Field::Complications)?,
        biomechanical_studies: number(Field::BiomechanicalStudies)?,
        citation_count: number(Field::CitationCount)?,
    };

    check_domain(&record, as_of_year)?;
    Ok(record)
}

fn check_domain(record: &GraftRecord, as_of_year: i32) -> Result<(), ScoreError> {
    if record.introduced > as_of_year {
        return Err(ScoreError::OutOfDomain {
            graft_type: record.graft_type.clone(),
            field: Field::Introduced,
            reason: format!("{} is after {}", record.introduced, as_of_year),
        });
    }

    let non_negative = [
        (Field::Complications, record.complications),
        (Field::BiomechanicalStudies, record.biomechanical_studies),
        (Field::CitationCount, record.citation_count),
    ];
    for (field, value) in non_negative {
        if value < 0.0 {
            return Err(ScoreError::OutOfDomain {
                graft_type: record.graft_type.clone(),
                field,
                reason: format!("must be non-negative, got {}", value),
            });
        }
    }

    Ok(())
}

// Spreadsheet exports often write integer columns as "1990.0"
fn parse_year(raw: &RawRecord, graft_type: &str) -> Result<i32, ScoreError> {
    let text = raw.get(Field::Introduced.column()).unwrap_or_default();
    let invalid = || ScoreError::InvalidValue {
        graft_type: graft_type.to_string(),
        field: Field::Introduced,
        value: text.to_string(),
    };

    if let Ok(year) = text.parse::<i32>() {
        return Ok(year);
    }
    let value: f64 = text.parse().map_err(|_| invalid())?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Ok(value as i32)
    } else {
        Err(invalid())
    }
}

fn parse_number(raw: &RawRecord, graft_type: &str, field: Field) -> Result<f64, ScoreError> {
    let text = raw.get(field.column()).unwrap_or_default();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ScoreError::InvalidValue {
            graft_type: graft_type.to_string(),
            field,
            value: text.to_string(),
        }),
    }
}
