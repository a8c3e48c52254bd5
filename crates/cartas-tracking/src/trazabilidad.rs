use std::collections::{HashMap, HashSet, VecDeque};

use cartas_types::Id;
use cartas_types::models::Carta;
use tracing::warn;

/// The thread a letter belongs to: the letters it answers (oldest first), the
/// letter itself, and every known letter answering something in the thread.
#[derive(Debug, Clone)]
pub struct Trazabilidad {
    anteriores: Vec<Carta>,
    actual: Carta,
    respuestas: Vec<Carta>,
}

impl Trazabilidad {
    /// Build the thread of `actual` from the letters in `known`.
    ///
    /// `known` may contain `actual` itself and unrelated letters. A letter is
    /// never listed twice, so cyclic `cartaAnterior` links terminate.
    pub fn build(actual: &Carta, known: &[Carta]) -> Self {
        let by_id: HashMap<Id, &Carta> = known.iter().map(|c| (c.id, c)).collect();

        let mut seen: HashSet<Id> = HashSet::new();
        seen.insert(actual.id);

        let mut anteriores = Vec::new();
        let mut next = actual.carta_anterior;
        while let Some(id) = next {
            if !seen.insert(id) {
                warn!(carta = actual.id, anterior = id, "cycle in cartaAnterior chain");
                break;
            }
            let Some(previa) = by_id.get(&id) else {
                break;
            };
            anteriores.push((*previa).clone());
            next = previa.carta_anterior;
        }
        anteriores.reverse();

        let mut respuestas = Vec::new();
        let mut queue: VecDeque<Id> = seen.iter().copied().collect();
        while let Some(parent) = queue.pop_front() {
            for carta in known {
                if carta.carta_anterior == Some(parent) && seen.insert(carta.id) {
                    respuestas.push(carta.clone());
                    queue.push_back(carta.id);
                }
            }
        }
        respuestas.sort_by_key(|c| (c.fecha_referencia(), c.id));

        Self {
            anteriores,
            actual: actual.clone(),
            respuestas,
        }
    }

    /// Letters `actual` answers, root first.
    pub fn anteriores(&self) -> &[Carta] {
        &self.anteriores
    }

    pub fn actual(&self) -> &Carta {
        &self.actual
    }

    /// Letters answering anything in the thread, oldest first.
    pub fn respuestas(&self) -> &[Carta] {
        &self.respuestas
    }

    /// Whole thread in reading order.
    pub fn hilo(&self) -> Vec<&Carta> {
        self.anteriores
            .iter()
            .chain(std::iter::once(&self.actual))
            .chain(self.respuestas.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carta(id: Id, anterior: Option<Id>) -> Carta {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "asunto": format!("Carta {id}"),
            "cartaAnterior": anterior,
        }))
        .unwrap()
    }

    fn ids(cartas: &[Carta]) -> Vec<Id> {
        cartas.iter().map(|c| c.id).collect()
    }

    #[test]
    fn walks_back_to_the_root() {
        let known = vec![carta(1, None), carta(2, Some(1)), carta(3, Some(2)), carta(9, None)];
        let t = Trazabilidad::build(&known[2], &known);
        assert_eq!(ids(t.anteriores()), vec![1, 2]);
        assert!(t.respuestas().is_empty());
        assert_eq!(t.hilo().len(), 3);
    }

    #[test]
    fn collects_responses_recursively() {
        let known = vec![
            carta(1, None),
            carta(2, Some(1)),
            carta(3, Some(2)),
            carta(4, Some(1)),
            carta(5, None),
        ];
        let t = Trazabilidad::build(&known[0], &known);
        assert!(t.anteriores().is_empty());
        assert_eq!(ids(t.respuestas()), vec![2, 3, 4]);
        let hilo: Vec<Id> = t.hilo().iter().map(|c| c.id).collect();
        assert_eq!(hilo, vec![1, 2, 3, 4]);
    }

    #[test]
    fn responses_to_ancestors_join_the_thread() {
        let known = vec![carta(1, None), carta(2, Some(1)), carta(3, Some(1))];
        let t = Trazabilidad::build(&known[1], &known);
        assert_eq!(ids(t.anteriores()), vec![1]);
        assert_eq!(ids(t.respuestas()), vec![3]);
    }

    #[test]
    fn missing_link_stops_the_walk() {
        let known = vec![carta(3, Some(2))];
        let t = Trazabilidad::build(&known[0], &known);
        assert!(t.anteriores().is_empty());
        assert_eq!(t.actual().id, 3);
    }

    #[test]
    fn cycles_terminate() {
        let known = vec![carta(1, Some(2)), carta(2, Some(1))];
        let t = Trazabilidad::build(&known[0], &known);
        assert_eq!(ids(t.anteriores()), vec![2]);
        assert!(t.respuestas().is_empty());
        assert_eq!(t.hilo().len(), 2);
    }
}
