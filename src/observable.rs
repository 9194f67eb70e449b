//! Reading already-resolved genotypes from delimited text.
//!
//! The expected layout is wide: one row per individual, one column per marker,
//! with an optional column naming the individual. Cells hold genotype strings
//! as the upstream parser wrote them (`AG`, `A/G`, ...). Empty cells are
//! no-calls and produce no observation.

use crate::error::{HeatmapError, Result};
use crate::GenotypeMap;
use csv;
use std::collections::{BTreeMap, VecDeque};
use std::io::Read;
use tracing::{trace, warn};

/// An observation that an individual carries a genotype at a marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub individual: String,
    pub marker: String,
    pub genotype: String,
}

#[derive(Clone)]
enum Field {
    Marker(String),
    Name,
}

/// Produces [`Observation`]s from delimited data.
///
/// `Csv` implements `Iterator`, so it can be passed directly to
/// [`Panel::observe`].
pub struct Csv {
    records: std::iter::Enumerate<csv::StringRecordsIntoIter<Box<dyn Read>>>,
    fields: Option<Vec<Field>>,
    buffer: VecDeque<Observation>,
}

impl Csv {
    fn new(records: csv::StringRecordsIntoIter<Box<dyn Read>>, fields: Option<Vec<Field>>) -> Self {
        Self {
            records: records.enumerate(),
            fields,
            buffer: VecDeque::new(),
        }
    }

    fn buffer_row(&mut self, idx: usize, row: &csv::StringRecord) {
        let mut individual = idx.to_string();
        let mut cells = vec![];
        for (i, value) in row.iter().enumerate() {
            let field = match &self.fields {
                Some(fields) => fields.get(i).cloned(),
                None => Some(Field::Marker(i.to_string())),
            };
            match field {
                Some(Field::Name) => individual = value.trim().to_string(),
                Some(Field::Marker(marker)) => cells.push((marker, value.trim().to_string())),
                None => warn!(row = idx, column = i, "value beyond the header, ignored"),
            }
        }
        for (marker, genotype) in cells {
            if genotype.is_empty() {
                trace!(row = idx, marker = marker.as_str(), "no-call skipped");
                continue;
            }
            self.buffer.push_back(Observation {
                individual: individual.clone(),
                marker,
                genotype,
            });
        }
    }
}

impl Iterator for Csv {
    type Item = Result<Observation>;

    fn next(&mut self) -> Option<Result<Observation>> {
        while self.buffer.is_empty() {
            match self.records.next()? {
                (idx, Ok(row)) => self.buffer_row(idx, &row),
                (_, Err(e)) => return Some(Err(HeatmapError::from(e))),
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

pub struct CsvBuilder {
    headers: bool,
    delimiter: u8,
    name_field: Option<String>,
}

impl CsvBuilder {
    /// Construct a new Csv builder
    pub fn new() -> Self {
        Self {
            headers: true,
            delimiter: b',',
            name_field: None,
        }
    }

    /// Without headers, markers are named by column index.
    pub fn headers(&mut self, headers: bool) -> &mut Self {
        self.headers = headers;
        self
    }

    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Column holding the individual's name. Without one, individuals are
    /// named by row index.
    pub fn name_field(&mut self, name_field: &str) -> &mut Self {
        self.name_field = Some(name_field.to_owned());
        self
    }

    pub fn from_reader(&self, reader: Box<dyn Read>) -> Result<Csv> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.headers)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let fields = if self.headers {
            Some(
                rdr.headers()?
                    .iter()
                    .map(|s| {
                        let s = s.trim();
                        match &self.name_field {
                            Some(name_field) if s == name_field.trim() => Field::Name,
                            _ => Field::Marker(s.into()),
                        }
                    })
                    .collect(),
            )
        } else {
            None
        };

        Ok(Csv::new(rdr.into_records(), fields))
    }
}

impl Default for CsvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Genotype maps of the observed individuals.
#[derive(Default)]
pub struct Panel {
    individuals: BTreeMap<String, GenotypeMap>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation; a later genotype for the same marker replaces
    /// the earlier one.
    fn record(&mut self, observation: Observation) {
        self.individuals
            .entry(observation.individual)
            .or_insert_with(GenotypeMap::new)
            .insert(observation.marker, observation.genotype);
    }

    /// Observe all the data in the argument.
    pub fn observe<I>(&mut self, observable: I) -> Result<()>
    where
        I: Iterator<Item = Result<Observation>>,
    {
        for observation in observable {
            self.record(observation?);
        }
        Ok(())
    }

    /// Names of all observed individuals, sorted.
    pub fn individuals(&self) -> Vec<&String> {
        self.individuals.keys().collect()
    }

    pub fn genotypes(&self, individual: &str) -> Option<&GenotypeMap> {
        self.individuals.get(individual)
    }
}
