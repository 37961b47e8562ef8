use crate::model::{Auditoria, BrandManual, Contenido, Estado};

/// Per-estado counts, derived from a loaded content collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub pendientes: usize,
    pub aprobados: usize,
    pub rechazados: usize,
}

impl ContentStats {
    pub fn from_contenidos(items: &[Contenido]) -> Self {
        items.iter().fold(Self::default(), |mut s, c| {
            match c.estado {
                Estado::Pendiente => s.pendientes += 1,
                Estado::Aprobado => s.aprobados += 1,
                Estado::Rechazado => s.rechazados += 1,
            }
            s
        })
    }
}

/// Admin dashboard counters. Computed from the three loaded collections;
/// there is no stats endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub total_manuals: usize,
    pub total_contenidos: usize,
    pub pendientes: usize,
    pub aprobados: usize,
    pub rechazados: usize,
    pub auditorias: usize,
}

impl AdminStats {
    pub fn compute(manuals: &[BrandManual], contenidos: &[Contenido], auditorias: &[Auditoria]) -> Self {
        let c = ContentStats::from_contenidos(contenidos);
        Self {
            total_manuals: manuals.len(),
            total_contenidos: contenidos.len(),
            pendientes: c.pendientes,
            aprobados: c.aprobados,
            rechazados: c.rechazados,
            auditorias: auditorias.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TipoContenido;

    fn item(estado: Estado) -> Contenido {
        Contenido {
            id: format!("{:?}", estado), brand_manual_id: "m".into(), tipo: TipoContenido::GuionVideo,
            titulo: "t".into(), contenido_text: None, estado, aprobado_por: None, rechazo_razon: None,
            created_by: None, created_at: String::new(), updated_at: String::new(),
        }
    }

    #[test]
    fn counts_match_recomputation() {
        let items: Vec<Contenido> = [Estado::Pendiente, Estado::Pendiente, Estado::Aprobado, Estado::Rechazado, Estado::Aprobado]
            .into_iter()
            .map(item)
            .collect();
        let s = AdminStats::compute(&[], &items, &[]);
        assert_eq!((s.pendientes, s.aprobados, s.rechazados), (2, 2, 1));
        assert_eq!(s.total_contenidos, 5);
        assert_eq!(s.total_manuals, 0);
        assert_eq!(s.auditorias, 0);
    }

    #[test]
    fn empty_collections() {
        assert_eq!(ContentStats::from_contenidos(&[]), ContentStats::default());
    }
}
