use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use cartas_types::Id;
use cartas_types::api::Paginated;
use cartas_types::inputs::{
    AreaInput, CartaInput, DestinatarioInput, EmpresaInput, RolInput, SubAreaInput, TemaInput,
    UsuarioInput,
};
use cartas_types::models::{Area, Carta, Destinatario, Empresa, Rol, SubArea, Tema, Usuario};

use crate::{ApiClient, ApiError, PageQuery};

/// A CRUD collection exposed by the API under `PATH`.
pub trait Resource {
    const PATH: &'static str;
    type Item: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;
    type Input: Serialize + Send + Sync;
}

macro_rules! resource {
    ($name:ident, $path:literal, $item:ty, $input:ty) => {
        pub struct $name;

        impl Resource for $name {
            const PATH: &'static str = $path;
            type Item = $item;
            type Input = $input;
        }
    };
}

resource!(Areas, "responsible-area", Area, AreaInput);
resource!(SubAreas, "sub-areas", SubArea, SubAreaInput);
resource!(Empresas, "company", Empresa, EmpresaInput);
resource!(Roles, "roles", Rol, RolInput);
resource!(Destinatarios, "receiver", Destinatario, DestinatarioInput);
resource!(Temas, "theme", Tema, TemaInput);
resource!(Usuarios, "users", Usuario, UsuarioInput);
resource!(Cartas, "cards", Carta, CartaInput);

impl ApiClient {
    pub async fn list<R: Resource>(
        &self,
        query: &PageQuery,
    ) -> Result<Paginated<R::Item>, ApiError> {
        self.fetch_page(R::PATH, query).await
    }

    /// Every record of `R`, e.g. to fill a select box.
    pub async fn list_all<R: Resource>(&self) -> Result<Vec<R::Item>, ApiError> {
        self.fetch_all(R::PATH, &PageQuery::default()).await
    }

    pub async fn get<R: Resource>(&self, id: Id) -> Result<R::Item, ApiError> {
        self.send(self.request(Method::GET, &format!("{}/{}", R::PATH, id)))
            .await
    }

    pub async fn create<R: Resource>(&self, input: &R::Input) -> Result<R::Item, ApiError> {
        self.send(self.request(Method::POST, R::PATH).json(input))
            .await
    }

    pub async fn update<R: Resource>(
        &self,
        id: Id,
        input: &R::Input,
    ) -> Result<R::Item, ApiError> {
        self.send(
            self.request(Method::PATCH, &format!("{}/{}", R::PATH, id))
                .json(input),
        )
        .await
    }

    pub async fn delete<R: Resource>(&self, id: Id) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::DELETE, &format!("{}/{}", R::PATH, id)))
            .await
    }
}
