//! Correspondence workflow endpoints: receive → assign → respond / close.

use std::collections::HashSet;

use reqwest::Method;
use tracing::{info, warn};

use cartas_tracking::Trazabilidad;
use cartas_types::Id;
use cartas_types::api::Paginated;
use cartas_types::inputs::{
    AsignacionInput, CartaInput, CartaRecibidaInput, EstadoInput, RespuestaInput,
};
use cartas_types::models::Carta;

use crate::resources::{Cartas, Resource};
use crate::{ApiClient, ApiError, PageQuery};

/// Longest `cartaAnterior` chain followed before giving up.
const MAX_CHAIN: usize = 50;

pub const ESTADO_CERRADO: &str = "Cerrado";

impl ApiClient {
    /// Letters registered as received.
    pub async fn received(&self, query: &PageQuery) -> Result<Paginated<Carta>, ApiError> {
        self.fetch_page("cards/received", query).await
    }

    /// Letters assigned to an area.
    pub async fn assigned(
        &self,
        area_id: Id,
        query: &PageQuery,
    ) -> Result<Paginated<Carta>, ApiError> {
        self.fetch_page(&format!("cards/assigned/{area_id}"), query)
            .await
    }

    /// Letters still awaiting an answer from an area.
    pub async fn pending(
        &self,
        area_id: Id,
        query: &PageQuery,
    ) -> Result<Paginated<Carta>, ApiError> {
        self.fetch_page(&format!("cards/pending/{area_id}"), query)
            .await
    }

    /// Outgoing letters.
    pub async fn emitidos(&self, query: &PageQuery) -> Result<Paginated<Carta>, ApiError> {
        self.fetch_page("cards/emitidos", query).await
    }

    /// Register an incoming letter whose PDF was already uploaded.
    pub async fn registrar(&self, input: CartaRecibidaInput) -> Result<Carta, ApiError> {
        let carta = self.create::<Cartas>(&CartaInput::Recibida(input)).await?;
        info!("Carta {} registrada ({})", carta.id, carta.codigo());
        Ok(carta)
    }

    /// Route a letter to an area and theme, with optional deadline.
    pub async fn assign(&self, id: Id, input: &AsignacionInput) -> Result<Carta, ApiError> {
        let carta: Carta = self
            .send(
                self.request(Method::PATCH, &format!("cards/assignment/{id}"))
                    .json(input),
            )
            .await?;
        info!("Carta {} asignada al área {:?}", id, input.area_responsable_id);
        Ok(carta)
    }

    /// Emit a letter answering `id`.
    pub async fn respond(&self, id: Id, mut input: RespuestaInput) -> Result<Carta, ApiError> {
        input.carta_anterior = Some(id);
        input.emitido = true;
        let carta = self.create::<Cartas>(&CartaInput::Respuesta(input)).await?;
        info!("Carta {} emitida en respuesta a {}", carta.id, id);
        Ok(carta)
    }

    pub async fn close(&self, id: Id) -> Result<Carta, ApiError> {
        let input = CartaInput::Estado(EstadoInput {
            estado: ESTADO_CERRADO.to_string(),
        });
        let carta = self.update::<Cartas>(id, &input).await?;
        info!("Carta {} cerrada", id);
        Ok(carta)
    }

    /// Every emitted letter, the pool answers are looked up in.
    pub async fn emitidas_all(&self) -> Result<Vec<Carta>, ApiError> {
        self.fetch_all(&format!("{}/emitidos", Cartas::PATH), &PageQuery::default())
            .await
    }

    /// The thread of letter `id`: its ancestors fetched one by one through
    /// `cartaAnterior`, and the emitted letters answering anything in it.
    pub async fn trazabilidad(&self, id: Id) -> Result<Trazabilidad, ApiError> {
        let emitidas = self.emitidas_all().await?;
        self.trazabilidad_con(id, emitidas).await
    }

    /// Like [`trazabilidad`](Self::trazabilidad), with the emitted letters
    /// already at hand.
    pub async fn trazabilidad_con(
        &self,
        id: Id,
        emitidas: Vec<Carta>,
    ) -> Result<Trazabilidad, ApiError> {
        let actual = self.get::<Cartas>(id).await?;

        let mut known = vec![actual.clone()];
        let mut seen: HashSet<Id> = HashSet::from([actual.id]);
        let mut next = actual.carta_anterior;
        while let Some(prev_id) = next {
            if !seen.insert(prev_id) || known.len() > MAX_CHAIN {
                break;
            }
            match self.get::<Cartas>(prev_id).await {
                Ok(prev) => {
                    next = prev.carta_anterior;
                    known.push(prev);
                }
                Err(e) if e.is_not_found() => {
                    warn!("Carta {} references missing carta {}", id, prev_id);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        known.extend(
            emitidas
                .into_iter()
                .filter(|c| c.carta_anterior.is_some() && !seen.contains(&c.id)),
        );

        Ok(Trazabilidad::build(&actual, &known))
    }
}
