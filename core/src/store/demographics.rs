use super::LendStore;
use crate::{
    codes::IncomeIndicator,
    demographics::{AggDemographics, AggDemographicsSource, TractDemographics},
    error::{LendError, LendResult},
    types::Year,
};
use rusqlite::{params, OptionalExtension};

impl LendStore {
    // ── Tract demographics ─────────────────────────────────────────

    pub fn insert_tract_demographics(&self, d: &TractDemographics) -> LendResult<()> {
        self.conn.execute(
            "INSERT INTO tract_demographics (
                tract_id, year, income_indicator, persons, females, males,
                non_hispanic_white, hispanic_only, black, asian, american_indian,
                pacific_islander, poverty, households, poverty_households,
                single_family_homes, single_family_occupied, male_adult, male_employed,
                female_adult, female_employed, median_family_income
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                &d.tract_id,
                d.year,
                d.income_indicator.as_str(),
                d.persons,
                d.females,
                d.males,
                d.non_hispanic_white,
                d.hispanic_only,
                d.black,
                d.asian,
                d.american_indian,
                d.pacific_islander,
                d.poverty,
                d.households,
                d.poverty_households,
                d.single_family_homes,
                d.single_family_occupied,
                d.male_adult,
                d.male_employed,
                d.female_adult,
                d.female_employed,
                d.median_family_income,
            ],
        )?;
        Ok(())
    }

    pub fn tract_demographics(&self, tract_id: &str, year: Year) -> LendResult<Option<TractDemographics>> {
        let row = self
            .conn
            .query_row(
                "SELECT tract_id, year, income_indicator, persons, females, males,
                        non_hispanic_white, hispanic_only, black, asian, american_indian,
                        pacific_islander, poverty, households, poverty_households,
                        single_family_homes, single_family_occupied, male_adult,
                        male_employed, female_adult, female_employed, median_family_income
                 FROM tract_demographics WHERE tract_id = ?1 AND year = ?2",
                params![tract_id, year],
                |row| {
                    Ok((
                        row.get::<_, String>(2)?,
                        TractDemographics {
                            tract_id: row.get(0)?,
                            year: row.get(1)?,
                            income_indicator: IncomeIndicator::Low,
                            persons: row.get(3)?,
                            females: row.get(4)?,
                            males: row.get(5)?,
                            non_hispanic_white: row.get(6)?,
                            hispanic_only: row.get(7)?,
                            black: row.get(8)?,
                            asian: row.get(9)?,
                            american_indian: row.get(10)?,
                            pacific_islander: row.get(11)?,
                            poverty: row.get(12)?,
                            households: row.get(13)?,
                            poverty_households: row.get(14)?,
                            single_family_homes: row.get(15)?,
                            single_family_occupied: row.get(16)?,
                            male_adult: row.get(17)?,
                            male_employed: row.get(18)?,
                            female_adult: row.get(19)?,
                            female_employed: row.get(20)?,
                            median_family_income: row.get(21)?,
                        },
                    ))
                },
            )
            .optional()?;
        match row {
            None => Ok(None),
            Some((indicator, mut dem)) => {
                dem.income_indicator = IncomeIndicator::parse(&indicator)
                    .ok_or_else(|| LendError::invalid("income_indicator", indicator))?;
                Ok(Some(dem))
            }
        }
    }

    // ── Area demographics ──────────────────────────────────────────

    pub fn insert_agg_demographics(&self, d: &AggDemographics) -> LendResult<()> {
        let (table, key) = agg_table(d.source);
        self.conn.execute(
            &format!(
                "INSERT INTO {table} ({key}, year, median_family_income,
                    median_household_income, ffiec_est_med_fam_income)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                &d.geoid,
                d.year,
                d.median_family_income,
                d.median_household_income,
                d.ffiec_est_med_fam_income,
            ],
        )?;
        Ok(())
    }

    /// Area demographics from one source table, if loaded for the year.
    pub fn agg_demographics(
        &self,
        source: AggDemographicsSource,
        geoid: &str,
        year: Year,
    ) -> LendResult<Option<AggDemographics>> {
        let (table, key) = agg_table(source);
        self.conn
            .query_row(
                &format!(
                    "SELECT {key}, year, median_family_income, median_household_income,
                            ffiec_est_med_fam_income
                     FROM {table} WHERE {key} = ?1 AND year = ?2"
                ),
                params![geoid, year],
                |row| {
                    Ok(AggDemographics {
                        source,
                        geoid: row.get(0)?,
                        year: row.get(1)?,
                        median_family_income: row.get(2)?,
                        median_household_income: row.get(3)?,
                        ffiec_est_med_fam_income: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}

fn agg_table(source: AggDemographicsSource) -> (&'static str, &'static str) {
    match source {
        AggDemographicsSource::MetroDivision => ("metdiv_demographics", "metdiv_id"),
        AggDemographicsSource::Cbsa => ("cbsa_demographics", "cbsa_id"),
        AggDemographicsSource::LowPopulation => ("low_population_demographics", "state_id"),
    }
}
