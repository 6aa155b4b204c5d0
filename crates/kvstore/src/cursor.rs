use crate::backend::Transaction;
use crate::error::Result;
use crate::range::KeyRange;
use crate::value::Value;

/// Forward cursor over one table of an open transaction.
pub struct Cursor<'a> {
    tx: &'a mut dyn Transaction,
    table: String,
    range: KeyRange,
    last: Option<String>,
    done: bool,
}

impl<'a> Cursor<'a> {
    pub fn open(tx: &'a mut dyn Transaction, table: &str, range: KeyRange) -> Self {
        Self {
            tx,
            table: table.to_string(),
            range,
            last: None,
            done: false,
        }
    }

    /// Advance to the next record, or `None` once the range is exhausted.
    pub async fn next(&mut self) -> Result<Option<(String, Value)>> {
        if self.done {
            return Ok(None);
        }
        let next = self
            .tx
            .next_in_range(&self.table, &self.range, self.last.as_deref())
            .await?;
        match &next {
            Some((key, _)) => self.last = Some(key.clone()),
            None => self.done = true,
        }
        Ok(next)
    }

    /// Advance to the next key, skipping the value.
    pub async fn next_key(&mut self) -> Result<Option<String>> {
        Ok(self.next().await?.map(|(key, _)| key))
    }
}
