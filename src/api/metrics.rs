//! Admin dashboard metrics endpoints

use crate::api::error::ApiError;
use crate::core::traits::MetricsService;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/conversaciones", get(conversations))
        .route("/actividades", get(activities))
        .route("/documentos", get(documents))
}

async fn overview(
    Inject(metrics_service): Inject<dyn MetricsService>,
) -> Result<Json<schemas::Overview>, ApiError> {
    Ok(Json(metrics_service.overview().await?.into()))
}

async fn conversations(
    Inject(metrics_service): Inject<dyn MetricsService>,
) -> Result<Json<schemas::Conversations>, ApiError> {
    Ok(Json(metrics_service.conversations().await?.into()))
}

async fn activities(
    Inject(metrics_service): Inject<dyn MetricsService>,
) -> Result<Json<schemas::Activities>, ApiError> {
    Ok(Json(metrics_service.activities().await?.into()))
}

async fn documents(
    Inject(metrics_service): Inject<dyn MetricsService>,
) -> Result<Json<schemas::Documents>, ApiError> {
    Ok(Json(metrics_service.documents().await?.into()))
}

pub mod schemas {
    use crate::core::metrics::{
        ActivityMetrics, ConversationMetrics, DocumentMetrics, MetricsOverview,
    };
    use crate::infrastructure::entities::GroupCount;
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Overview {
        pub total_contents: i64,
        pub total_activities: i64,
        pub total_resources: i64,
        pub completion_rate: i64,
        pub average_satisfaction: f64,
        pub average_time_days: i64,
        pub active_users: i64,
        pub total_interactions: i64,
    }

    impl From<MetricsOverview> for Overview {
        fn from(m: MetricsOverview) -> Self {
            Overview {
                total_contents: m.total_contents,
                total_activities: m.total_activities,
                total_resources: m.total_resources,
                completion_rate: m.completion_rate,
                average_satisfaction: m.average_satisfaction,
                average_time_days: m.average_time_days,
                active_users: m.active_users,
                total_interactions: m.total_interactions,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Conversations {
        pub total: i64,
        pub activas: i64,
        pub resueltas: i64,
        pub con_satisfaccion: i64,
        pub promedio_satisfaccion: f64,
        pub total_mensajes: i64,
    }

    impl From<ConversationMetrics> for Conversations {
        fn from(m: ConversationMetrics) -> Self {
            Conversations {
                total: m.total,
                activas: m.active,
                resueltas: m.resolved,
                con_satisfaccion: m.rated,
                promedio_satisfaccion: m.average_satisfaction,
                total_mensajes: m.total_messages,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ByModality {
        pub modalidad: String,
        pub count: i64,
    }

    #[derive(Serialize, Debug)]
    pub struct ByCategory {
        pub categoria: String,
        pub count: i64,
    }

    #[derive(Serialize, Debug)]
    pub struct ByType {
        pub tipo: String,
        pub count: i64,
    }

    impl From<GroupCount> for ByModality {
        fn from(g: GroupCount) -> Self {
            ByModality {
                modalidad: g.label,
                count: g.count,
            }
        }
    }

    impl From<GroupCount> for ByCategory {
        fn from(g: GroupCount) -> Self {
            ByCategory {
                categoria: g.label,
                count: g.count,
            }
        }
    }

    impl From<GroupCount> for ByType {
        fn from(g: GroupCount) -> Self {
            ByType {
                tipo: g.label,
                count: g.count,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Activities {
        pub total: i64,
        pub obligatorias: i64,
        pub por_modalidad: Vec<ByModality>,
        pub por_tipo: Vec<ByType>,
        pub capacidad_total: i64,
    }

    impl From<ActivityMetrics> for Activities {
        fn from(m: ActivityMetrics) -> Self {
            Activities {
                total: m.total,
                obligatorias: m.mandatory,
                por_modalidad: m.by_modality.into_iter().map(ByModality::from).collect(),
                por_tipo: m.by_kind.into_iter().map(ByType::from).collect(),
                capacidad_total: m.total_capacity,
            }
        }
    }

    #[derive(Serialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct Documents {
        pub total: i64,
        pub obligatorios: i64,
        pub por_categoria: Vec<ByCategory>,
        pub por_tipo: Vec<ByType>,
        pub total_accesos: i64,
        pub total_descargas: i64,
    }

    impl From<DocumentMetrics> for Documents {
        fn from(m: DocumentMetrics) -> Self {
            Documents {
                total: m.total,
                obligatorios: m.mandatory,
                por_categoria: m.by_category.into_iter().map(ByCategory::from).collect(),
                por_tipo: m.by_kind.into_iter().map(ByType::from).collect(),
                total_accesos: m.total_accesses,
                total_descargas: m.total_downloads,
            }
        }
    }
}
