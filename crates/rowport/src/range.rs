use rowport_common::RangeExpr;
use rowport_schema::RowSchema;
use rowport_store::GridStore;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{DictCodec, RecordCodec, RowDecoder, RowEncoder, RowView, SchemaCodec, TypedRow};
use crate::cursor::RangeCursor;
use crate::error::{CallbackError, RangeError};
use crate::planner::{self, MapReport};
use crate::reduce;

/// A named range of one spreadsheet: a header row followed by data rows.
///
/// Each operation performs exactly one read. `map*` operations add at most
/// one batched write, issued only after every row has been transformed.
pub struct Range<'s, S: ?Sized> {
    store: &'s S,
    expr: RangeExpr,
}

impl<'s, S: GridStore + ?Sized> Range<'s, S> {
    pub fn new(store: &'s S, expr: impl Into<RangeExpr>) -> Self {
        Self {
            store,
            expr: expr.into(),
        }
    }

    pub fn expr(&self) -> &RangeExpr {
        &self.expr
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    /// Fetch the range and decode rows with `decoder`.
    pub fn iter_with<D: RowDecoder>(&self, decoder: D) -> Result<RangeCursor<D>, RangeError> {
        RangeCursor::open(self.store, &self.expr, decoder)
    }

    /// Rows as ordered column to cell mappings.
    pub fn iter(&self) -> Result<RangeCursor<DictCodec>, RangeError> {
        self.iter_with(DictCodec)
    }

    /// Rows decoded and validated through `schema`.
    pub fn iter_typed(&self, schema: &RowSchema) -> Result<RangeCursor<SchemaCodec>, RangeError> {
        self.iter_with(SchemaCodec::new(schema.clone())?)
    }

    /// Rows deserialized into `T` after schema validation.
    pub fn iter_as<T: DeserializeOwned>(
        &self,
        schema: &RowSchema,
    ) -> Result<RangeCursor<RecordCodec<T>>, RangeError> {
        self.iter_with(RecordCodec::new(schema.clone())?)
    }

    pub fn map_with<C, F>(&self, codec: C, transform: F) -> Result<MapReport, RangeError>
    where
        C: RowEncoder,
        F: FnMut(C::Item) -> Option<C::Item>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("map", range = %self.expr).entered();
        let cursor = self.iter_with(codec)?;
        let worksheet = cursor.worksheet().clone();
        let plan = planner::plan(cursor, transform)?;
        let rows_updated = planner::apply(self.store, &worksheet, &plan.instructions)?;
        Ok(MapReport {
            rows_scanned: plan.rows_scanned,
            rows_updated,
        })
    }

    pub fn try_map_with<C, F, E>(&self, codec: C, transform: F) -> Result<MapReport, RangeError>
    where
        C: RowEncoder,
        F: FnMut(C::Item) -> Result<Option<C::Item>, E>,
        E: Into<CallbackError>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("try_map", range = %self.expr).entered();
        let cursor = self.iter_with(codec)?;
        let worksheet = cursor.worksheet().clone();
        let plan = planner::try_plan(cursor, transform)?;
        let rows_updated = planner::apply(self.store, &worksheet, &plan.instructions)?;
        Ok(MapReport {
            rows_scanned: plan.rows_scanned,
            rows_updated,
        })
    }

    /// Transform untyped rows and write the changed ones back.
    pub fn map<F>(&self, transform: F) -> Result<MapReport, RangeError>
    where
        F: FnMut(RowView) -> Option<RowView>,
    {
        self.map_with(DictCodec, transform)
    }

    pub fn try_map<F, E>(&self, transform: F) -> Result<MapReport, RangeError>
    where
        F: FnMut(RowView) -> Result<Option<RowView>, E>,
        E: Into<CallbackError>,
    {
        self.try_map_with(DictCodec, transform)
    }

    pub fn map_typed<F>(&self, schema: &RowSchema, transform: F) -> Result<MapReport, RangeError>
    where
        F: FnMut(TypedRow) -> Option<TypedRow>,
    {
        self.map_with(SchemaCodec::new(schema.clone())?, transform)
    }

    pub fn map_as<T, F>(&self, schema: &RowSchema, transform: F) -> Result<MapReport, RangeError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut(T) -> Option<T>,
    {
        self.map_with(RecordCodec::<T>::new(schema.clone())?, transform)
    }

    pub fn reduce_with<D, A, F>(&self, decoder: D, initial: A, combine: F) -> Result<A, RangeError>
    where
        D: RowDecoder,
        F: FnMut(A, D::Item) -> A,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("reduce", range = %self.expr).entered();
        reduce::reduce(self.iter_with(decoder)?, initial, combine)
    }

    pub fn try_reduce_with<D, A, F, E>(
        &self,
        decoder: D,
        initial: A,
        combine: F,
    ) -> Result<A, RangeError>
    where
        D: RowDecoder,
        F: FnMut(A, D::Item) -> Result<A, E>,
        E: Into<CallbackError>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("try_reduce", range = %self.expr).entered();
        reduce::try_reduce(self.iter_with(decoder)?, initial, combine)
    }

    pub fn reduce<A, F>(&self, initial: A, combine: F) -> Result<A, RangeError>
    where
        F: FnMut(A, RowView) -> A,
    {
        self.reduce_with(DictCodec, initial, combine)
    }

    pub fn try_reduce<A, F, E>(&self, initial: A, combine: F) -> Result<A, RangeError>
    where
        F: FnMut(A, RowView) -> Result<A, E>,
        E: Into<CallbackError>,
    {
        self.try_reduce_with(DictCodec, initial, combine)
    }

    pub fn reduce_typed<A, F>(&self, schema: &RowSchema, initial: A, combine: F) -> Result<A, RangeError>
    where
        F: FnMut(A, TypedRow) -> A,
    {
        self.reduce_with(SchemaCodec::new(schema.clone())?, initial, combine)
    }

    pub fn reduce_as<T, A, F>(&self, schema: &RowSchema, initial: A, combine: F) -> Result<A, RangeError>
    where
        T: DeserializeOwned,
        F: FnMut(A, T) -> A,
    {
        self.reduce_with(RecordCodec::<T>::new(schema.clone())?, initial, combine)
    }
}
