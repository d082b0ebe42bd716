use std::sync::Arc;

use crate::domain::{
    ActivityRepository, AssociationRepository, CompanyRepository, ContactRelationRepository,
    ContactRepository, PolicyRepository, ProjectRepository, UserRepository,
};

/// The repositories a CRM service works against
#[derive(Clone)]
pub struct CrmRepositories {
    pub contacts: Arc<dyn ContactRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub policies: Arc<dyn PolicyRepository>,
    pub associations: Arc<dyn AssociationRepository>,
    pub relations: Arc<dyn ContactRelationRepository>,
    pub users: Arc<dyn UserRepository>,
}
