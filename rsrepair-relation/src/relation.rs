use rsrepair_types::{ColorDistribution, RepairError, RepairResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Column layout shared by a relation and every sub-relation cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
    representative: usize,
    labels: Vec<String>,
}

impl Schema {
    pub fn new(
        columns: Vec<String>,
        representative: &str,
        labels: Vec<String>,
    ) -> RepairResult<Self> {
        let representative = columns
            .iter()
            .position(|c| c == representative)
            .ok_or_else(|| RepairError::UnknownColumn {
                column: representative.to_string(),
            })?;
        Ok(Self {
            columns,
            representative,
            labels,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> RepairResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| RepairError::UnknownColumn {
                column: name.to_string(),
            })
    }

    pub fn representative(&self) -> usize {
        self.representative
    }

    pub fn representative_name(&self) -> &str {
        &self.columns[self.representative]
    }

    /// Category labels, indexed by category.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn categories(&self) -> usize {
        self.labels.len()
    }
}

/// One input tuple. `id` is its position in the loaded relation and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: usize,
    pub values: Vec<String>,
    pub category: usize,
}

impl Row {
    pub fn value(&self, column: usize) -> &str {
        self.values.get(column).map(String::as_str).unwrap_or("")
    }

    /// Values of `columns`, in the given order.
    pub fn key(&self, columns: &[usize]) -> Vec<String> {
        columns.iter().map(|&c| self.value(c).to_string()).collect()
    }
}

pub fn is_missing(value: &str) -> bool {
    value.trim().is_empty()
}

/// An ordered bag of rows plus its cached color distribution.
///
/// Rows are shared behind `Arc`, so slicing and unioning never copy row data.
#[derive(Debug, Clone)]
pub struct Relation {
    schema: Arc<Schema>,
    rows: Vec<Arc<Row>>,
    distribution: ColorDistribution,
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.rows == other.rows
    }
}

impl Relation {
    pub fn new(schema: Arc<Schema>, rows: Vec<Arc<Row>>) -> RepairResult<Self> {
        let mut distribution = ColorDistribution::zeros(schema.categories());
        for row in &rows {
            if row.values.len() != schema.columns().len() {
                return Err(RepairError::invalid_input(format!(
                    "row {} has {} values, header has {} columns",
                    row.id,
                    row.values.len(),
                    schema.columns().len()
                )));
            }
            distribution.increment(row.category)?;
        }
        Ok(Self {
            schema,
            rows,
            distribution,
        })
    }

    /// Build a relation from raw string records, factorizing the representative column in order
    /// of first appearance.
    pub fn from_records(
        columns: Vec<String>,
        representative: &str,
        records: Vec<Vec<String>>,
    ) -> RepairResult<Self> {
        let rep = columns
            .iter()
            .position(|c| c == representative)
            .ok_or_else(|| RepairError::UnknownColumn {
                column: representative.to_string(),
            })?;

        let missing = records
            .iter()
            .filter(|r| r.get(rep).is_none_or(|v| is_missing(v)))
            .count();
        if missing > 0 {
            return Err(RepairError::MissingData {
                column: representative.to_string(),
                rows: missing,
            });
        }

        let mut labels: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut rows = Vec::with_capacity(records.len());
        for (id, values) in records.into_iter().enumerate() {
            let label = values[rep].clone();
            let category = *index.entry(label.clone()).or_insert_with(|| {
                labels.push(label);
                labels.len() - 1
            });
            rows.push(Arc::new(Row {
                id,
                values,
                category,
            }));
        }

        let schema = Arc::new(Schema::new(columns, representative, labels)?);
        Self::new(schema, rows)
    }

    pub fn empty(schema: Arc<Schema>) -> Self {
        let distribution = ColorDistribution::zeros(schema.categories());
        Self {
            schema,
            rows: Vec::new(),
            distribution,
        }
    }

    pub fn empty_like(&self) -> Self {
        Self::empty(Arc::clone(&self.schema))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn rows(&self) -> &[Arc<Row>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn distribution(&self) -> &ColorDistribution {
        &self.distribution
    }

    pub fn categories(&self) -> usize {
        self.schema.categories()
    }

    fn same_schema(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema
    }

    /// Keep the rows for which `keep` returns true, preserving order.
    pub fn retain(&self, mut keep: impl FnMut(&Row) -> bool) -> Self {
        let rows: Vec<Arc<Row>> = self.rows.iter().filter(|r| keep(r)).cloned().collect();
        self.sibling(rows)
    }

    /// A relation over the same schema from rows already validated against it.
    fn sibling(&self, rows: Vec<Arc<Row>>) -> Self {
        let mut counts = vec![0u64; self.categories()];
        for row in &rows {
            if let Some(n) = counts.get_mut(row.category) {
                *n += 1;
            }
        }
        Self {
            schema: Arc::clone(&self.schema),
            rows,
            distribution: ColorDistribution::from_counts(counts),
        }
    }

    /// Rows at the given positions, in ascending position order.
    pub fn select(&self, mut positions: Vec<usize>) -> Self {
        positions.sort_unstable();
        positions.dedup();
        let mut pos = positions.into_iter().peekable();
        let mut i = 0usize;
        self.retain(|_| {
            let hit = pos.peek() == Some(&i);
            if hit {
                pos.next();
            }
            i += 1;
            hit
        })
    }

    pub fn filter_eq(&self, columns: &[usize], values: &[String]) -> Self {
        self.retain(|row| {
            columns
                .iter()
                .zip(values)
                .all(|(&c, v)| row.value(c) == v)
        })
    }

    /// Split into groups sharing the same values on `columns`, in order of first appearance.
    pub fn partition_by(&self, columns: &[usize]) -> Vec<(Vec<String>, Relation)> {
        let mut slot: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<(Vec<String>, Vec<Arc<Row>>)> = Vec::new();
        for row in &self.rows {
            let key = row.key(columns);
            let i = match slot.get(&key) {
                Some(&i) => i,
                None => {
                    slot.insert(key.clone(), groups.len());
                    groups.push((key, Vec::new()));
                    groups.len() - 1
                }
            };
            groups[i].1.push(Arc::clone(row));
        }
        groups
            .into_iter()
            .map(|(key, rows)| (key, self.sibling(rows)))
            .collect()
    }

    pub fn distinct_values(&self, columns: &[usize]) -> Vec<Vec<String>> {
        self.partition_by(columns)
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    /// Disjoint union: rows of `self` followed by rows of `other`.
    pub fn union(&self, other: &Self) -> RepairResult<Self> {
        let mut out = self.clone();
        out.extend(other)?;
        Ok(out)
    }

    pub fn extend(&mut self, other: &Self) -> RepairResult<()> {
        if !self.same_schema(other) {
            return Err(RepairError::invalid_input(format!(
                "cannot union relations over different schemas: [{}] vs [{}]",
                self.schema.columns().join(","),
                other.schema.columns().join(",")
            )));
        }
        self.distribution.add_assign(&other.distribution)?;
        self.rows.extend(other.rows.iter().cloned());
        Ok(())
    }

    /// The first `counts[i]` rows of each category `i`, in input order.
    pub fn take_per_category(&self, counts: &[u64]) -> Self {
        let mut left = counts.to_vec();
        self.retain(|row| match left.get_mut(row.category) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
    }

    /// Final row count per representative label.
    pub fn label_distribution(&self) -> BTreeMap<String, u64> {
        self.schema
            .labels()
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), self.distribution.count(i)))
            .collect()
    }

    /// Reject the relation if any of `columns` holds a missing value.
    pub fn ensure_complete<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> RepairResult<()> {
        for name in columns {
            let c = self.schema.column_index(name)?;
            let rows = self.rows.iter().filter(|r| is_missing(r.value(c))).count();
            if rows > 0 {
                return Err(RepairError::MissingData {
                    column: name.to_string(),
                    rows,
                });
            }
        }
        Ok(())
    }
}
