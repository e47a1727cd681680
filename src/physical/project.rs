//! `Project` operator (spec §4.6.3): selects a column subset. A no-op
//! when the child already produces exactly this projection.

use super::plan::Plan;
use crate::arrow_util::Batch;
use crate::error::{EngineError, EngineResult};
use crate::iceberg_source::Schema;

pub struct Project {
    child: Box<dyn Plan>,
    columns: Vec<String>,
}

impl Project {
    pub fn new(child: Box<dyn Plan>, columns: Vec<String>) -> Self {
        Project { child, columns }
    }

    fn is_noop(&self) -> bool {
        let child_schema = self.child.schema();
        child_schema.fields.len() == self.columns.len()
            && child_schema
                .fields
                .iter()
                .zip(&self.columns)
                .all(|(f, name)| &f.name == name)
    }
}

impl Plan for Project {
    fn open(&mut self) -> EngineResult<()> {
        self.child.open()
    }

    fn next_batch(&mut self) -> EngineResult<Option<Batch>> {
        let Some(batch) = self.child.next_batch()? else {
            return Ok(None);
        };
        if self.is_noop() {
            return Ok(Some(batch));
        }
        let projected = batch
            .project(&self.columns)
            .map_err(|e| EngineError::schema(e.to_string()))?;
        Ok(Some(projected))
    }

    fn close(&mut self) -> EngineResult<()> {
        self.child.close()
    }

    fn estimated_rows(&self) -> u64 {
        self.child.estimated_rows()
    }

    fn schema(&self) -> Schema {
        let child_schema = self.child.schema();
        Schema {
            fields: child_schema
                .fields
                .into_iter()
                .filter(|f| self.columns.contains(&f.name))
                .collect(),
            partition_spec: child_schema.partition_spec,
        }
    }
}
